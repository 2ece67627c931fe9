use serde::Serialize;

/// One external tool the launcher knows how to install and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub id: &'static str,
    /// Executable looked up on PATH
    pub name: &'static str,
    /// Debian package providing the executable
    pub package: &'static str,
    pub description: &'static str,
}

// Kept in ascending id order.
static TOOLS: &[Tool] = &[
    Tool {
        id: "1",
        name: "exiftool",
        package: "libimage-exiftool-perl",
        description: "Shows and analyses EXIF, IPTC and XMP metadata of images and other files.",
    },
    Tool {
        id: "2",
        name: "file",
        package: "file",
        description: "Detects the real file type from signatures (magic numbers).",
    },
    Tool {
        id: "3",
        name: "strings",
        package: "binutils",
        description: "Extracts printable strings from binary files.",
    },
    Tool {
        id: "4",
        name: "xxd",
        package: "xxd",
        description: "Produces a hexadecimal dump of the file.",
    },
    Tool {
        id: "5",
        name: "binwalk",
        package: "binwalk",
        description: "Scans files for signatures, sections, compression and embedded data.",
    },
    Tool {
        id: "6",
        name: "bulk_extractor",
        package: "bulk-extractor",
        description: "Extracts forensic artifacts such as URLs, e-mails or patterns from raw data.",
    },
    Tool {
        id: "7",
        name: "pdfinfo",
        package: "poppler-utils",
        description: "Shows metadata and structural information of PDF documents.",
    },
    Tool {
        id: "8",
        name: "identify",
        package: "imagemagick",
        description: "Shows image information, formats, dimensions and profiles.",
    },
];

pub fn all() -> &'static [Tool] {
    TOOLS
}

/// Resolve a selection to a tool: exact id first, then executable name
/// (case-insensitive).
pub fn resolve(selection: &str) -> Option<&'static Tool> {
    if selection.is_empty() {
        return None;
    }
    if let Some(tool) = TOOLS.iter().find(|t| t.id == selection) {
        return Some(tool);
    }
    TOOLS.iter().find(|t| t.name.eq_ignore_ascii_case(selection))
}

pub fn listing() -> String {
    let mut s = String::from("Available tools:");
    for t in TOOLS {
        s.push_str(&format!("\n  {}. {} - {}", t.id, t.name, t.description));
    }
    s
}
