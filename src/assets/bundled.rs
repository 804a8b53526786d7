use crate::types::{Severity, StatusIcon};

/// Prefix for keys served from the assets compiled into the binary
pub const BUNDLED_PREFIX: &str = "bundled:";

/// Icons shipped with the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Critical,
    High,
    Medium,
    Low,
    Informational,
    Pass,
    Fail,
    Pending,
    Resolved,
    Ack,
}

impl Icon {
    pub const ALL: [Icon; 10] = [
        Icon::Critical,
        Icon::High,
        Icon::Medium,
        Icon::Low,
        Icon::Informational,
        Icon::Pass,
        Icon::Fail,
        Icon::Pending,
        Icon::Resolved,
        Icon::Ack,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Icon::Critical => "critical",
            Icon::High => "high",
            Icon::Medium => "medium",
            Icon::Low => "low",
            Icon::Informational => "informational",
            Icon::Pass => "pass",
            Icon::Fail => "fail",
            Icon::Pending => "pending",
            Icon::Resolved => "resolved",
            Icon::Ack => "ack",
        }
    }

    /// Asset cache key
    pub fn key(&self) -> String {
        format!("{}{}", BUNDLED_PREFIX, self.name())
    }

    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Icon::Critical,
            Severity::High => Icon::High,
            Severity::Medium => Icon::Medium,
            Severity::Low => Icon::Low,
            Severity::Informational => Icon::Informational,
        }
    }

    pub fn for_status(icon: StatusIcon) -> Self {
        match icon {
            StatusIcon::Pending => Icon::Pending,
            StatusIcon::Resolved => Icon::Resolved,
            StatusIcon::Ack => Icon::Ack,
        }
    }

    /// Pass/fail icon for a risk flag; `true` means the risk is present
    pub fn for_flag(detected: bool) -> Self {
        if detected {
            Icon::Fail
        } else {
            Icon::Pass
        }
    }
}

/// Look up a bundled asset by logical name
pub fn lookup(name: &str) -> Option<&'static [u8]> {
    let bytes: &'static [u8] = match name {
        "critical" => include_bytes!("../../assets/icons/critical.png"),
        "high" => include_bytes!("../../assets/icons/high.png"),
        "medium" => include_bytes!("../../assets/icons/medium.png"),
        "low" => include_bytes!("../../assets/icons/low.png"),
        "informational" => include_bytes!("../../assets/icons/informational.png"),
        "pass" => include_bytes!("../../assets/icons/pass.png"),
        "fail" => include_bytes!("../../assets/icons/fail.png"),
        "pending" => include_bytes!("../../assets/icons/pending.png"),
        "resolved" => include_bytes!("../../assets/icons/resolved.png"),
        "ack" => include_bytes!("../../assets/icons/ack.png"),
        _ => return None,
    };
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_icon_is_bundled() {
        for icon in Icon::ALL {
            let bytes = lookup(icon.name()).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"), "{} is not a PNG", icon.name());
        }
        assert!(lookup("missing").is_none());
    }

    #[test]
    fn test_icon_keys() {
        assert_eq!(Icon::Critical.key(), "bundled:critical");
        assert_eq!(Icon::for_status(StatusIcon::Ack), Icon::Ack);
        assert_eq!(Icon::for_flag(true), Icon::Fail);
    }
}
