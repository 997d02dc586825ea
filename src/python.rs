use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ClientConfig, DEFAULT_MAX_REQUESTS_PER_SECOND};
use crate::http::{ApiEndpoint, RateLimitedClient};
use crate::rate_limiter;

/// Python-facing limiter; the GIL is released while waiting
#[pyclass(name = "RateLimiter")]
pub struct PyRateLimiter {
    inner: Arc<rate_limiter::RateLimiter>,
}

#[pymethods]
impl PyRateLimiter {
    #[new]
    #[pyo3(signature = (max_requests_per_second = DEFAULT_MAX_REQUESTS_PER_SECOND))]
    pub fn new(max_requests_per_second: f64) -> PyResult<Self> {
        let limiter = rate_limiter::RateLimiter::new(max_requests_per_second)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(limiter),
        })
    }

    /// Shared limiter the native clients use for `endpoint`
    #[staticmethod]
    pub fn for_endpoint(endpoint: &str) -> PyResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let inner =
            rate_limiter::registry::shared(endpoint).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn wait_if_needed(&self, py: Python<'_>) {
        let limiter = Arc::clone(&self.inner);
        py.allow_threads(move || limiter.wait_if_needed());
    }

    #[getter]
    pub fn max_requests_per_second(&self) -> f64 {
        self.inner.max_requests_per_second()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight()
    }
}

/// Rate-limited GET client for one of the supported APIs
#[pyclass(name = "ApiClient")]
pub struct PyApiClient {
    inner: Arc<RateLimitedClient>,
}

#[pymethods]
impl PyApiClient {
    #[new]
    pub fn new(endpoint: &str) -> PyResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let config = ClientConfig::from_env().map_err(|e| PyValueError::new_err(e.to_string()))?;
        let client = RateLimitedClient::new(endpoint, config)
            .map_err(|e| PyRuntimeError::new_err(format!("Client setup failed: {}", e)))?;
        Ok(Self {
            inner: Arc::new(client),
        })
    }

    #[pyo3(signature = (path, params = None))]
    pub fn get_text(
        &self,
        py: Python<'_>,
        path: String,
        params: Option<HashMap<String, String>>,
    ) -> PyResult<String> {
        let client = Arc::clone(&self.inner);
        py.allow_threads(move || {
            let query = as_query(&params);
            client.get_text(&path, &query)
        })
        .map_err(|e| PyRuntimeError::new_err(format!("Request failed: {}", e)))
    }

    /// JSON body re-serialised as a string, for `json.loads` on the Python side
    #[pyo3(signature = (path, params = None))]
    pub fn get_json(
        &self,
        py: Python<'_>,
        path: String,
        params: Option<HashMap<String, String>>,
    ) -> PyResult<String> {
        let client = Arc::clone(&self.inner);
        let value = py
            .allow_threads(move || {
                let query = as_query(&params);
                client.get_json(&path, &query)
            })
            .map_err(|e| PyRuntimeError::new_err(format!("Request failed: {}", e)))?;
        Ok(value.to_string())
    }

    #[getter]
    pub fn endpoint(&self) -> String {
        self.inner.endpoint().to_string()
    }
}

fn parse_endpoint(name: &str) -> PyResult<ApiEndpoint> {
    name.parse().map_err(PyValueError::new_err)
}

fn as_query(params: &Option<HashMap<String, String>>) -> Vec<(&str, &str)> {
    params
        .iter()
        .flatten()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

// PyO3 module definition - exposes the limiter and client to the Python tools
#[pymodule]
fn biotools_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    crate::logging::init();

    m.add_class::<PyRateLimiter>()?;
    m.add_class::<PyApiClient>()?;

    Ok(())
}
