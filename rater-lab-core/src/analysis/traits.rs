//! Analyzer Traits
//!
//! Common trait that every pipeline stage implements. Stages consume and
//! produce contract types only, and must be deterministic for the same input.

use async_trait::async_trait;

/// Trait for all validation pipeline stages.
///
/// Every stage MUST:
/// - Consume and produce types from the contracts module
/// - Validate its input before executing
/// - Return deterministic, machine-readable output
/// - Surface recoverable problems as warnings, not errors
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Input type for this stage
    type Input: Clone + Send + Sync;

    /// Output type for this stage
    type Output: Clone + Send + Sync;

    /// Error type for this stage
    type Error: std::error::Error + Send + Sync;

    /// Stable stage name, used in telemetry and logs.
    fn name(&self) -> &'static str;

    /// Validate input according to contracts.
    fn validate_input(&self, input: &Self::Input) -> Result<(), Self::Error>;

    /// Execute the stage's core logic.
    ///
    /// MUST be deterministic for the same input.
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    /// Full invocation cycle: validate, then execute.
    async fn invoke(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        self.validate_input(&input)?;
        self.execute(input).await
    }
}
