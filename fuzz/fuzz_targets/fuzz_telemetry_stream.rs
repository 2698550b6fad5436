#![no_main]
use libfuzzer_sys::fuzz_target;
use venitrain_core::{FrameAssembler, RollingWindow, parse_line};

fuzz_target!(|input: (u8, &[u8])| {
    let (split, data) = input;
    let step = usize::from(split.max(1));
    let mut assembler = FrameAssembler::with_raw_capacity(8);
    let mut window = RollingWindow::with_capacity(4);
    for chunk in data.chunks(step) {
        for line in assembler.feed(chunk) {
            assert!(!line.contains('\n'));
            if let Ok(sample) = parse_line(&line, 0.0) {
                assert!(sample.angle_raw.is_finite() && sample.pressure.is_finite());
                window.append(sample);
            }
        }
        assert!(window.len() <= 4);
        assert!(assembler.raw_lines().len() <= 8);
    }
});
