use pyo3::prelude::*;
use pyo3::sync::GILOnceCell;
use pyo3::types::PyDict;

// An abi3-py38 module may only be initialized once per interpreter.
static MODULE: GILOnceCell<Py<PyModule>> = GILOnceCell::new();

fn load(py: Python<'_>) -> Bound<'_, PyModule> {
    MODULE
        .get_or_init(py, || pyo3::wrap_pymodule!(estouaver::estouaver)(py))
        .bind(py)
        .clone()
}

fn doc(object: &Bound<'_, PyAny>) -> String {
    object.getattr("__doc__").unwrap().extract().unwrap()
}

#[test]
fn module_exposes_estou_a_ver_with_its_docstrings() {
    Python::with_gil(|py| {
        let module = load(py);
        assert_eq!(doc(module.as_any()), "estou-a-ver code extension module");

        let function = module.getattr("estou_a_ver").unwrap();
        assert!(function.is_callable());
        assert_eq!(doc(&function), "Prints estou-a-ver");
    });
}

#[test]
fn call_without_arguments_returns_none() {
    Python::with_gil(|py| {
        let function = load(py).getattr("estou_a_ver").unwrap();
        assert!(function.call0().unwrap().is_none());
    });
}

#[test]
fn extra_positional_and_keyword_arguments_are_ignored() {
    Python::with_gil(|py| {
        let function = load(py).getattr("estou_a_ver").unwrap();

        let kwargs = PyDict::new(py);
        kwargs.set_item("k", 3).unwrap();
        let result = function
            .call((1, "x", py.None()), Some(&kwargs))
            .unwrap();
        assert!(result.is_none());

        let result = function.call1((vec![1, 2, 3], 2.5)).unwrap();
        assert!(result.is_none());
    });
}

#[test]
fn repeated_calls_return_none_every_time() {
    Python::with_gil(|py| {
        let function = load(py).getattr("estou_a_ver").unwrap();
        for _ in 0..3 {
            assert!(function.call0().unwrap().is_none());
        }
    });
}
