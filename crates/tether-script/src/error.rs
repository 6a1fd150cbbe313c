use rhai::EvalAltResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script evaluation failed: {0}")]
    Eval(String),
}

// The engine's error type is not Send + Sync, so the rendered text is kept
// instead of the boxed error itself.
impl From<Box<EvalAltResult>> for ScriptError {
    fn from(err: Box<EvalAltResult>) -> ScriptError {
        ScriptError::Eval(err.to_string())
    }
}
