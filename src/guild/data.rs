use serde_json::Value;

/// Arbitrary per-guild payload stored next to the settings.
///
/// The guild lifecycle never looks inside the payload.  Implementors decide how their data maps
/// to and from its persisted JSON form.
pub trait GuildData: Clone + Send + Sync + 'static {
    /// Persistable form of the current data
    fn prepare_data(&self) -> Value;
    /// Replace the current data with a persisted payload.  An error marks the payload as corrupt.
    fn apply_loaded_data(&mut self, payload: Value) -> Result<(), serde_json::Error>;
}

/// Fully opaque payload, kept exactly as stored
impl GuildData for Value {
    fn prepare_data(&self) -> Value {
        self.clone()
    }

    fn apply_loaded_data(&mut self, payload: Value) -> Result<(), serde_json::Error> {
        *self = payload;
        Ok(())
    }
}
