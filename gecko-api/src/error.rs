//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use gecko_config::Phase;
use gecko_core::{CoreError, EvalError, LookupError, ModuleError, TypeError};
use serde::Serialize;
use thiserror::Error;

/// Gecko 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeckoError {
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// Raised by a module method, step or constructor
    #[error("module '{module}': {error}")]
    Module { module: String, error: ModuleError },

    /// Malformed project description
    #[error("project error: {0}")]
    Project(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<CoreError> for GeckoError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Type(e) => GeckoError::Type(e),
            CoreError::Lookup(e) => GeckoError::Lookup(e),
            CoreError::Eval(e) => GeckoError::Eval(e),
            CoreError::Module(e) => GeckoError::module("?", e),
        }
    }
}

impl From<serde_json::Error> for GeckoError {
    fn from(err: serde_json::Error) -> Self {
        GeckoError::Project(err.to_string())
    }
}

impl From<std::io::Error> for GeckoError {
    fn from(err: std::io::Error) -> Self {
        GeckoError::Io(err.to_string())
    }
}

impl GeckoError {
    pub fn module(module: impl Into<String>, error: ModuleError) -> Self {
        GeckoError::Module {
            module: module.into(),
            error,
        }
    }

    /// 获取错误阶段
    pub fn phase(&self) -> Phase {
        match self {
            GeckoError::Type(_) | GeckoError::Lookup(_) | GeckoError::Project(_) => Phase::Build,
            GeckoError::Io(_) => Phase::Build,
            GeckoError::Eval(_) => Phase::Tick,
            GeckoError::Module { error, .. } => match error {
                ModuleError::Argument(_) | ModuleError::UnknownMethod { .. } => Phase::Call,
                ModuleError::Config(_) | ModuleError::Lookup(_) | ModuleError::Type(_) => {
                    Phase::Build
                }
                ModuleError::Eval(_) | ModuleError::Transport(_) => Phase::Tick,
            },
        }
    }

    /// Short machine-readable kind, stable across message wording changes
    pub fn kind(&self) -> &'static str {
        match self {
            GeckoError::Type(_) => "TypeError",
            GeckoError::Lookup(_) => "LookupError",
            GeckoError::Eval(EvalError::DivisionByZero) => "DivisionByZero",
            GeckoError::Eval(EvalError::InvalidOperation { .. }) => "InvalidOperation",
            GeckoError::Module { error, .. } => match error {
                ModuleError::Argument(_) => "ArgumentError",
                ModuleError::UnknownMethod { .. } => "UnknownMethodError",
                ModuleError::Eval(_) => "EvalError",
                ModuleError::Lookup(_) => "LookupError",
                ModuleError::Type(_) => "TypeError",
                ModuleError::Transport(_) => "TransportError",
                ModuleError::Config(_) => "ConfigError",
            },
            GeckoError::Project(_) => "ProjectError",
            GeckoError::Io(_) => "IoError",
        }
    }

    /// 转换为结构化错误报告
    pub fn to_report(&self) -> ErrorReport {
        let module = match self {
            GeckoError::Module { module, .. } => Some(module.clone()),
            _ => None,
        };
        ErrorReport {
            phase: self.phase().as_str(),
            error_kind: self.kind(),
            module,
            message: self.to_string(),
        }
    }
}

/// 结构化错误报告
///
/// 上层应用（CLI、Web）可以根据自己的需求格式化。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// build, tick, call or bus
    pub phase: &'static str,
    pub error_kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.phase, self.message)
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.error_kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gecko_core::{ArgumentError, Type};

    #[test]
    fn test_phase_mapping() {
        let err = GeckoError::from(TypeError::Arithmetic {
            left: Type::String,
            right: Type::Integer,
        });
        assert_eq!(err.phase(), Phase::Build);

        let err = GeckoError::from(EvalError::DivisionByZero);
        assert_eq!(err.phase(), Phase::Tick);
        assert_eq!(err.kind(), "DivisionByZero");

        let err = GeckoError::module(
            "motor",
            ModuleError::UnknownMethod {
                module: "motor".into(),
                method: "spin".into(),
            },
        );
        assert_eq!(err.phase(), Phase::Call);
        assert_eq!(err.kind(), "UnknownMethodError");
    }

    #[test]
    fn test_core_error_flattening() {
        let err: GeckoError = CoreError::Lookup(LookupError::UnknownVariable("x".into())).into();
        assert_eq!(err, GeckoError::Lookup(LookupError::UnknownVariable("x".into())));
    }

    #[test]
    fn test_report() {
        let err = GeckoError::module(
            "motor",
            ArgumentError::Count {
                method: "on".into(),
                expected: 0,
                found: 2,
            }
            .into(),
        );
        let report = err.to_report();
        assert_eq!(report.phase, "call");
        assert_eq!(report.module.as_deref(), Some("motor"));
        assert_eq!(report.to_string(), "[call] module 'motor': on() expects 0 argument(s), got 2");
        assert_eq!(report.to_short(), "ArgumentError: module 'motor': on() expects 0 argument(s), got 2");

        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["phase"], "call");
        assert_eq!(json["error_kind"], "ArgumentError");
    }

    #[test]
    fn test_report_json_skips_missing_module() {
        let report = GeckoError::Project("missing field `name`".into()).to_report();
        let json = report.to_json();
        assert!(!json.contains("module"));
        assert!(json.contains("\"phase\":\"build\""));
    }
}
