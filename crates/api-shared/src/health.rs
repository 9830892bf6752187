use crate::types::HealthRes;

/// Simple health service shared by the REST API and the binaries.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "PCM is alive".into(),
        }
    }
}
