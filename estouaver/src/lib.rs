//! Python bindings for the greeter.

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyTuple};
use shared_files::{core_header, greeter};

/// Prints estou-a-ver
// Extra positional and keyword arguments are accepted and ignored.
#[pyfunction]
#[pyo3(signature = (*_args, **_kwargs))]
pub fn estou_a_ver(
    _args: &Bound<'_, PyTuple>,
    _kwargs: Option<&Bound<'_, PyDict>>,
) -> PyResult<()> {
    // io::Error surfaces as OSError.
    greeter::estou_a_ver()?;
    Ok(())
}

#[pymodule]
pub fn estouaver(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.setattr("__doc__", core_header::MODULE_DOC)?;
    m.add_function(wrap_pyfunction!(estou_a_ver, m)?)?;
    Ok(())
}
