#![no_main]
use ice_config::ScenarioCommand;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(ScenarioCommand::StartAtHeight(m)) = data.parse::<ScenarioCommand>() {
        assert!(m.is_finite() && m > 0.0);
    }
});
