use std::time::Duration;

use crate::domain::ImageError;

pub(crate) fn read_env_var(name: &str) -> Result<Option<String>, ImageError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(ImageError::validation(format!(
            "{name} could not be read: {error}"
        ))),
    }
}

pub(crate) fn parse_timeout_seconds(name: &str, value: &str) -> Result<Duration, ImageError> {
    let parsed = value.trim().parse::<u64>().map_err(|_| {
        ImageError::validation(format!("{name} must be a positive integer in seconds"))
    })?;
    if parsed == 0 {
        return Err(ImageError::validation(format!(
            "{name} must be greater than 0 seconds"
        )));
    }
    Ok(Duration::from_secs(parsed))
}

pub(crate) fn read_timeout_from_env(name: &str) -> Result<Option<Duration>, ImageError> {
    let Some(value) = read_env_var(name)? else {
        return Ok(None);
    };
    Ok(Some(parse_timeout_seconds(name, &value)?))
}

pub(crate) fn parse_max_edge(name: &str, value: &str) -> Result<u32, ImageError> {
    let parsed = value
        .trim()
        .parse::<u32>()
        .map_err(|_| ImageError::validation(format!("{name} must be a positive integer")))?;
    if parsed == 0 {
        return Err(ImageError::validation(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(parsed)
}

pub(crate) fn read_max_edge_from_env(name: &str) -> Result<Option<u32>, ImageError> {
    let Some(value) = read_env_var(name)? else {
        return Ok(None);
    };
    Ok(Some(parse_max_edge(name, &value)?))
}
