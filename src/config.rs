//! Per-unit compiler settings.

/// Which target the emitted module is configured for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSelection {
    /// Leave the module without a triple or data layout.
    #[default]
    None,
    /// The machine the compiler runs on.
    Host,
    /// An explicit LLVM target triple, e.g. `x86_64-unknown-linux-gnu`.
    Triple(String),
}

impl TargetSelection {
    /// Parses the command-line spelling: `host` or a triple.
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "" | "none" => TargetSelection::None,
            "host" => TargetSelection::Host,
            triple => TargetSelection::Triple(triple.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub module_name: String,
    pub target: TargetSelection,
    /// Run the LLVM verifier once lowering finished.
    pub verify_module: bool,
    /// Let the IR builder fold all-constant operations.
    pub fold_constants: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            module_name: String::from("main"),
            target: TargetSelection::None,
            verify_module: true,
            fold_constants: false,
        }
    }
}

impl CompilerConfig {
    pub fn new(module_name: impl Into<String>) -> Self {
        CompilerConfig {
            module_name: module_name.into(),
            ..CompilerConfig::default()
        }
    }

    pub fn with_target(mut self, target: TargetSelection) -> Self {
        self.target = target;
        self
    }

    pub fn with_verify_module(mut self, verify_module: bool) -> Self {
        self.verify_module = verify_module;
        self
    }

    pub fn with_fold_constants(mut self, fold_constants: bool) -> Self {
        self.fold_constants = fold_constants;
        self
    }
}
