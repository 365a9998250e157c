//! Host tool checks before an installation.

use crate::InstallError;
use std::path::PathBuf;

/// System directories checked when a tool is not on PATH.
///
/// Disk tools live in sbin, which is often missing from a service's PATH.
const FALLBACK_PATHS: &[&str] = &["/usr/sbin", "/sbin", "/usr/local/sbin", "/usr/bin", "/bin"];

/// Find an executable by name.
///
/// Tries the PATH via the `which` crate first, then [`FALLBACK_PATHS`].
pub(crate) fn find_tool(name: &str) -> Option<PathBuf> {
    if let Ok(path) = which::which(name) {
        return Some(path);
    }

    FALLBACK_PATHS
        .iter()
        .map(|dir| PathBuf::from(dir).join(name))
        .find(|path| path.is_file())
}

/// Check that every tool in `tools` can be found.
///
/// Returns [`InstallError::MissingTool`] for the first one that cannot.
pub(crate) fn check_tools<'a, I>(tools: I) -> Result<(), InstallError>
where
    I: IntoIterator<Item = &'a str>,
{
    for tool in tools {
        if find_tool(tool).is_none() {
            return Err(InstallError::MissingTool {
                name: tool.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_common_tool() {
        // sh exists on any Linux system
        let path = find_tool("sh").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_find_nonexistent_tool() {
        assert!(find_tool("definitely_not_a_real_tool_12345").is_none());
    }

    #[test]
    fn test_check_tools_names_first_missing() {
        let result = check_tools(["sh", "definitely_not_a_real_tool_12345", "also_missing_678"]);
        match result {
            Err(InstallError::MissingTool { name }) => {
                assert_eq!(name, "definitely_not_a_real_tool_12345")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_check_tools_ok() {
        assert!(check_tools(["sh"]).is_ok());
        assert!(check_tools([]).is_ok());
    }
}
