use std::fs;
use std::path::Path;

const OS_RELEASE: &str = "/etc/os-release";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Debian,
    Fedora,
    OpenSuse,
    Arch,
}

impl Family {
    pub fn as_str(self) -> &'static str {
        match self { Family::Debian => "debian", Family::Fedora => "fedora", Family::OpenSuse => "opensuse", Family::Arch => "arch" }
    }
}

/// Classify the host by reading /etc/os-release.
pub fn detect_host() -> Option<Family> {
    detect_from(Path::new(OS_RELEASE))
}

pub fn detect_from(path: &Path) -> Option<Family> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            log::debug!("cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    let (id, id_like) = parse_os_release(&text);
    let fam = classify_ids(&id, &id_like);
    log::debug!("os-release ID={:?} ID_LIKE={:?} -> {:?}", id, id_like, fam);
    fam
}

pub fn is_debian_like(fam: Option<Family>) -> bool {
    fam == Some(Family::Debian)
}

fn parse_os_release(s: &str) -> (Option<String>, Vec<String>) {
    let mut id: Option<String> = None;
    let mut id_like: Vec<String> = Vec::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if let Some(rest) = line.strip_prefix("ID=") {
            id = Some(unquote(rest).to_ascii_lowercase());
        } else if let Some(rest) = line.strip_prefix("ID_LIKE=") {
            let raw = unquote(rest).to_ascii_lowercase();
            id_like.extend(raw.split_whitespace().map(|t| t.to_string()));
        }
    }
    (id, id_like)
}

fn unquote(s: &str) -> &str {
    let t = s.trim();
    if t.len() >= 2 && ((t.starts_with('"') && t.ends_with('"')) || (t.starts_with('\'') && t.ends_with('\''))) {
        &t[1..t.len() - 1]
    } else { t }
}

fn classify_ids(id: &Option<String>, id_like: &[String]) -> Option<Family> {
    let has = |k: &str| id.as_deref() == Some(k) || id_like.iter().any(|t| t == k);
    if has("debian") || has("ubuntu") || has("kali") { return Some(Family::Debian); }
    if has("fedora") || has("rhel") || has("centos") { return Some(Family::Fedora); }
    if has("opensuse") || has("sles") || has("suse") { return Some(Family::OpenSuse); }
    if has("arch") || has("manjaro") || has("endeavouros") { return Some(Family::Arch); }
    None
}
