use super::interceptor::Interceptor;
use super::lifecycle::ProbeRuntime;
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl fmt::Debug for ProbeRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_probe_runtime(self, f)
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_interceptor(self, f)
    }
}
