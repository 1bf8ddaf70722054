use std::path::PathBuf;

const DATA_DIR_ENV: &str = "PRESENCE_TRACKER_HOME";
const DATA_DIR_NAME: &str = ".presence-tracker";

pub fn resolve_data_dir() -> Result<PathBuf, String> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
    Ok(PathBuf::from(home).join(DATA_DIR_NAME))
}
