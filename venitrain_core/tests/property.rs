use proptest::prelude::*;
use venitrain_core::framing::FrameAssembler;
use venitrain_core::window::RollingWindow;
use venitrain_core::{TelemetrySample, parse_line};

fn feed_all(chunks: &[&[u8]]) -> (Vec<String>, String) {
    let mut fa = FrameAssembler::with_raw_capacity(10_000);
    let mut lines = Vec::new();
    for c in chunks {
        lines.extend(fa.feed(c));
    }
    (lines, fa.pending().to_owned())
}

prop_compose! {
    fn stream_strategy()(
        lines in prop::collection::vec("[a-zA-Z0-9:. éß€😀-]{0,24}", 0..20),
        crlf in any::<bool>(),
        tail in "[a-z0-9é]{0,6}",
    ) -> Vec<u8> {
        let sep = if crlf { "\r\n" } else { "\n" };
        let mut s = String::new();
        for l in &lines {
            s.push_str(l);
            s.push_str(sep);
        }
        s.push_str(&tail);
        s.into_bytes()
    }
}

proptest! {
    #[test]
    fn chunk_boundaries_do_not_change_lines(
        bytes in stream_strategy(),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..12),
    ) {
        let (whole, whole_pending) = feed_all(&[&bytes]);

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
        points.sort_unstable();
        points.dedup();
        let mut chunks: Vec<&[u8]> = Vec::new();
        let mut start = 0;
        for p in points {
            chunks.push(&bytes[start..p]);
            start = p;
        }
        chunks.push(&bytes[start..]);

        let (split, split_pending) = feed_all(&chunks);
        prop_assert_eq!(split, whole);
        prop_assert_eq!(split_pending, whole_pending);
    }

    #[test]
    fn formatted_records_parse_back(
        angle_raw in -720.0f64..720.0,
        pressure in 0.0f64..1000.0,
        angle_processed in -90.0f64..90.0,
        vein in any::<bool>(),
        elapsed in 0.0f64..3600.0,
    ) {
        let line = format!(
            "angleR:{angle_raw} pressure:{pressure} angleP:{angle_processed} vein:{}",
            u8::from(vein)
        );
        let s = parse_line(&line, elapsed).unwrap();
        prop_assert_eq!(s, TelemetrySample {
            time_s: elapsed,
            angle_raw,
            pressure,
            angle_processed,
            vein_touch: vein,
        });
    }

    #[test]
    fn parser_never_panics(line in "\\PC{0,80}") {
        let _ = parse_line(&line, 0.0);
    }

    #[test]
    fn window_never_exceeds_capacity(cap in 1usize..200, n in 0usize..500) {
        let mut w = RollingWindow::with_capacity(cap);
        for i in 0..n {
            w.append(TelemetrySample {
                time_s: i as f64,
                angle_raw: 0.0,
                pressure: 0.0,
                angle_processed: 0.0,
                vein_touch: false,
            });
        }
        prop_assert_eq!(w.len(), n.min(cap));
        if n > 0 {
            prop_assert_eq!(w.latest().map(|s| s.time_s), Some((n - 1) as f64));
        }
    }
}
