use instance_reaper_core::contract::InstanceObservation;

/// Compute-API operations the reaper consumes. Implementations flatten the
/// provider's reservation nesting before returning observations.
pub trait InstanceApi {
    fn describe_by_tags(
        &self,
        tag_key: &str,
        tag_values: Option<&[String]>,
    ) -> Result<Vec<InstanceObservation>, String>;

    fn describe_by_ids(&self, ids: &[String]) -> Result<Vec<InstanceObservation>, String>;

    /// Requests a stop and returns the IDs the API reports transitioning.
    fn stop_instances(&self, ids: &[String]) -> Result<Vec<String>, String>;

    /// Requests termination and returns the IDs the API reports transitioning.
    fn terminate_instances(&self, ids: &[String]) -> Result<Vec<String>, String>;
}
