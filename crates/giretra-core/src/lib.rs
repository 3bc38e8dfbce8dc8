#![deny(warnings)]
pub mod game;
pub mod model;
pub mod negotiation;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "giretra"
    }

    pub const fn codename() -> &'static str {
        "Belote Engine"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "giretra");
        assert_eq!(AppInfo::codename(), "Belote Engine");
        assert!(!AppInfo::version().is_empty());
    }
}
