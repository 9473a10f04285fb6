//! Environment overrides live in their own test binary: the variables are process-wide.

use std::{env, fs};
use waterlock_app::config::load_config;
use waterlock_connector::config::{Backend, FanOut};

#[test]
fn test_environment_overrides_kebab_case_keys() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("waterlock.toml");
    fs::write(
        &path,
        r#"
[connector.messaging]
fan-out = "sequential"

[app.companion]
connect-result-code = 0
"#,
    )?;

    env::set_var("WATERLOCK__CONNECTOR__BACKEND", "accessory");
    env::set_var("WATERLOCK__CONNECTOR__MESSAGING__FAN_OUT", "parallel");
    env::set_var("WATERLOCK__CONNECTOR__CHANNELS__STATUS_BUFFER", "7");
    env::set_var("WATERLOCK__APP__COMPANION__CONNECT_RESULT_CODE", "1029");
    let loaded = load_config(&path.to_string_lossy());
    for key in [
        "WATERLOCK__CONNECTOR__BACKEND",
        "WATERLOCK__CONNECTOR__MESSAGING__FAN_OUT",
        "WATERLOCK__CONNECTOR__CHANNELS__STATUS_BUFFER",
        "WATERLOCK__APP__COMPANION__CONNECT_RESULT_CODE",
    ] {
        env::remove_var(key);
    }
    let config = loaded?;

    assert_eq!(config.connector.backend, Backend::Accessory);
    assert_eq!(config.connector.messaging.fan_out, FanOut::Parallel);
    assert_eq!(config.connector.channels.status_buffer, 7);
    assert_eq!(config.app.companion.connect_result_code, 1029);
    Ok(())
}
