#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    if let Ok(cfg) = venitrain_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        let _ = venitrain_core::SessionCfg::try_from(&cfg.session);
    }
});
