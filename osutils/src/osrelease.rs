use anyhow::{Context, Error};
use const_format::formatcp;

/// Absolute path to the /etc/os-release file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Parsed contents of /etc/os-release, covering the fields the Fact
/// Collector stamps onto `Misc` (§3.1: `distro`, `distro_pretty`,
/// `distro_codename`, `distro_id`, `distro_like`).
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct OsRelease {
    pub name: Option<String>,
    pub pretty_name: Option<String>,
    pub version_codename: Option<String>,
    pub id: Option<String>,
    pub id_like: Option<String>,
}

impl OsRelease {
    /// Reads and parses /etc/os-release.
    pub fn read() -> Result<Self, Error> {
        Ok(Self::parse(
            &std::fs::read_to_string(OS_RELEASE_PATH)
                .context(formatcp!("Failed to read '{OS_RELEASE_PATH}'"))?,
        ))
    }

    fn parse(data: &str) -> Self {
        let mut os_release = OsRelease::default();
        for line in data.lines() {
            if line.is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let Some((key, raw_value)) = line.trim().split_once('=') else {
                continue;
            };

            let value = || {
                Some(
                    raw_value
                        .trim()
                        .trim_matches('\"')
                        .trim_matches('\'')
                        .to_string(),
                )
            };

            match key {
                "NAME" => os_release.name = value(),
                "PRETTY_NAME" => os_release.pretty_name = value(),
                "VERSION_CODENAME" => os_release.version_codename = value(),
                "ID" => os_release.id = value(),
                "ID_LIKE" => os_release.id_like = value(),
                _ => {}
            }
        }

        os_release
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fedora() {
        let data = indoc::indoc! {
            r#"
            NAME="Fedora Linux"
            VERSION="40 (Workstation Edition)"
            ID=fedora
            VERSION_CODENAME=""
            PRETTY_NAME="Fedora Linux 40 (Workstation Edition)"
            ID_LIKE="rhel suse"
            "#,
        };

        let os_release = OsRelease::parse(data);

        assert_eq!(os_release.id, Some("fedora".to_string()));
        assert_eq!(os_release.name, Some("Fedora Linux".to_string()));
        assert_eq!(
            os_release.pretty_name,
            Some("Fedora Linux 40 (Workstation Edition)".to_string())
        );
        assert_eq!(os_release.id_like, Some("rhel suse".to_string()));
    }

    #[test]
    fn test_parse_debian_codename() {
        let data = indoc::indoc! {
            r#"
            NAME="Debian GNU/Linux"
            ID=debian
            VERSION_CODENAME=bookworm
            PRETTY_NAME="Debian GNU/Linux 12 (bookworm)"
            "#,
        };

        let os_release = OsRelease::parse(data);

        assert_eq!(os_release.version_codename, Some("bookworm".to_string()));
    }
}
