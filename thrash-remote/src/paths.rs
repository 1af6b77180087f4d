//! Parsing of `nvme list-subsys` output.
//!
//! Each path line looks like
//!
//! ```text
//!  +- nvme0 tcp traddr=10.0.0.1,trsvcid=4420,src_addr=10.0.0.9 live optimized
//! ```
//!
//! where the fourth token is the controller state and the optional fifth is
//! the ANA state.

/// One controller path to a subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathState {
    /// Controller device, e.g. `nvme0`.
    pub controller: String,
    /// Transport, e.g. `tcp`.
    pub transport: String,
    /// Transport address string.
    pub address: String,
    /// Controller state: `live`, `connecting`, `resetting`, `deleting`, ...
    pub state: String,
    /// ANA state, if reported: `optimized`, `non-optimized`, `inaccessible`, ...
    pub ana: Option<String>,
}

impl PathState {
    /// Controller is live and the path is ANA optimized.
    pub fn is_live_optimized(&self) -> bool {
        self.state == "live" && self.ana.as_deref() == Some("optimized")
    }

    /// Controller is being torn down and will not come back on its own.
    pub fn is_dead(&self) -> bool {
        matches!(self.state.as_str(), "dead" | "deleting")
    }
}

/// Paths found in one `list-subsys` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSummary {
    /// All parsed paths in listing order.
    pub paths: Vec<PathState>,
}

impl PathSummary {
    /// At least one live optimized path and no dead path.
    pub fn is_healthy(&self) -> bool {
        self.paths.iter().any(PathState::is_live_optimized)
            && !self.paths.iter().any(PathState::is_dead)
    }

    /// One-line description for logs and violations.
    pub fn describe(&self) -> String {
        if self.paths.is_empty() {
            return "no paths".to_string();
        }
        self.paths
            .iter()
            .map(|p| match &p.ana {
                Some(ana) => format!("{}={} {}", p.controller, p.state, ana),
                None => format!("{}={}", p.controller, p.state),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse the path lines of `nvme list-subsys` output. Other lines are ignored.
pub fn parse_list_subsys(output: &str) -> PathSummary {
    let paths = output
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("+-"))
        .filter_map(|rest| {
            let mut tokens = rest.split_whitespace();
            let controller = tokens.next()?;
            let transport = tokens.next()?;
            let address = tokens.next()?;
            let state = tokens.next()?;
            Some(PathState {
                controller: controller.to_string(),
                transport: transport.to_string(),
                address: address.to_string(),
                state: state.to_string(),
                ana: tokens.next().map(str::to_string),
            })
        })
        .collect();
    PathSummary { paths }
}
