// src/packages/traits.rs

//! Common traits for package records

/// Common interface for every package shape the resolver looks at
///
/// Implemented by AUR RPC results and by local/sync database entries. Absent
/// relationship fields are reported as empty slices.
pub trait PackageRecord {
    /// Get the package name
    fn name(&self) -> &str;

    /// Get the full `[epoch:]version[-release]` string
    fn version(&self) -> &str;

    /// Get the raw `conflicts` lines
    fn conflicts(&self) -> &[String];

    /// Get the raw `replaces` lines
    fn replaces(&self) -> &[String];

    /// Get the raw `provides` lines
    fn provides(&self) -> &[String];

    /// Union of `conflicts` and `replaces`, deduplicated, in declaration order
    fn conflict_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for line in self.conflicts().iter().chain(self.replaces()) {
            if !lines.contains(line) {
                lines.push(line.clone());
            }
        }
        lines
    }
}
