//! In-memory SSC stand-in.
//!
//! Stores every submitted variable, tracks which handles are alive, and runs
//! modules according to a scripted [`ExecBehaviour`]. Used where the licensed
//! engine binary is not available.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use super::{DataHandle, LogEntry, LogLevel, ModuleHandle, SscApi};
use crate::error::{Error, Result};
use crate::params::{ParameterSet, Value};

/// What a module run does.
#[derive(Debug, Clone)]
pub enum ExecBehaviour {
    /// Succeeds and stores `compute(inputs)` under `output`.
    Output {
        output: String,
        compute: fn(&ParameterSet) -> Vec<f64>,
    },
    /// Fails, logging each message as an error.
    Fail(Vec<String>),
    /// Fails with the given log entries as they are.
    FailWithLog(Vec<LogEntry>),
    /// Succeeds without writing anything.
    NoOutput,
}

/// Snapshot of one module run.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub module: String,
    /// Content of the data object at the time of the run.
    pub inputs: ParameterSet,
}

#[derive(Debug)]
struct ModuleState {
    name: String,
    log: Vec<LogEntry>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: usize,
    data: HashMap<usize, ParameterSet>,
    modules: HashMap<usize, ModuleState>,
    executions: Vec<Execution>,
    data_created: usize,
    invalid_frees: usize,
}

impl State {
    fn allocate(&mut self) -> usize {
        self.next_handle += 1;
        self.next_handle
    }

    fn data_mut(&mut self, handle: DataHandle) -> Result<&mut ParameterSet> {
        self.data
            .get_mut(&handle.as_raw())
            .ok_or(Error::InvalidHandle(handle.as_raw()))
    }
}

/// Recording engine.
#[derive(Debug)]
pub struct RecordingSsc {
    modules: BTreeSet<String>,
    behaviour: ExecBehaviour,
    state: RefCell<State>,
}

impl RecordingSsc {
    /// Engine offering only `module`, run with `behaviour`.
    pub fn new(module: &str, behaviour: ExecBehaviour) -> Self {
        Self {
            modules: BTreeSet::from([module.to_string()]),
            behaviour,
            state: RefCell::new(State::default()),
        }
    }

    /// `pvwattsv5` producing `gen` from `compute`.
    pub fn pvwatts(compute: fn(&ParameterSet) -> Vec<f64>) -> Self {
        Self::new(
            crate::adapter::PVWATTS_MODULE,
            ExecBehaviour::Output {
                output: crate::adapter::GENERATION_OUTPUT.to_string(),
                compute,
            },
        )
    }

    /// Runs recorded so far, oldest first.
    pub fn executions(&self) -> Vec<Execution> {
        self.state.borrow().executions.clone()
    }

    /// Data objects allocated and not yet freed.
    pub fn live_data(&self) -> usize {
        self.state.borrow().data.len()
    }

    /// Modules allocated and not yet freed.
    pub fn live_modules(&self) -> usize {
        self.state.borrow().modules.len()
    }

    /// Total data objects ever allocated.
    pub fn data_created(&self) -> usize {
        self.state.borrow().data_created
    }

    /// Frees of handles that were unknown or already freed.
    pub fn invalid_frees(&self) -> usize {
        self.state.borrow().invalid_frees
    }
}

impl SscApi for RecordingSsc {
    fn version(&self) -> i32 {
        0
    }

    fn data_create(&self) -> Result<DataHandle> {
        let mut state = self.state.borrow_mut();
        let raw = state.allocate();
        state.data.insert(raw, ParameterSet::new());
        state.data_created += 1;
        Ok(DataHandle::from_raw(raw))
    }

    fn data_free(&self, data: DataHandle) {
        let mut state = self.state.borrow_mut();
        if state.data.remove(&data.as_raw()).is_none() {
            state.invalid_frees += 1;
        }
    }

    fn data_set_number(&self, data: DataHandle, name: &str, value: f64) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.data_mut(data)?.set_number(name, value);
        Ok(())
    }

    fn data_set_array(&self, data: DataHandle, name: &str, values: &[f64]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.data_mut(data)?.set_array(name, values.to_vec());
        Ok(())
    }

    fn data_set_table(&self, data: DataHandle, name: &str, table: DataHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let copy = state
            .data
            .get(&table.as_raw())
            .cloned()
            .ok_or(Error::InvalidHandle(table.as_raw()))?;
        state.data_mut(data)?.set_table(name, copy);
        Ok(())
    }

    fn data_get_array(&self, data: DataHandle, name: &str) -> Result<Option<Vec<f64>>> {
        let mut state = self.state.borrow_mut();
        Ok(state.data_mut(data)?.array(name).map(<[f64]>::to_vec))
    }

    fn module_create(&self, name: &str) -> Result<Option<ModuleHandle>> {
        if !self.modules.contains(name) {
            return Ok(None);
        }
        let mut state = self.state.borrow_mut();
        let raw = state.allocate();
        state.modules.insert(
            raw,
            ModuleState {
                name: name.to_string(),
                log: Vec::new(),
            },
        );
        Ok(Some(ModuleHandle::from_raw(raw)))
    }

    fn module_exec(&self, module: ModuleHandle, data: DataHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(inputs) = state.data.get(&data.as_raw()).cloned() else {
            return false;
        };
        let Some(name) = state.modules.get(&module.as_raw()).map(|m| m.name.clone()) else {
            return false;
        };
        state.executions.push(Execution {
            module: name,
            inputs: inputs.clone(),
        });

        let (ok, log) = match &self.behaviour {
            ExecBehaviour::Output { output, compute } => {
                let values = compute(&inputs);
                if let Some(target) = state.data.get_mut(&data.as_raw()) {
                    target.set(output.clone(), Value::Array(values));
                }
                (true, Vec::new())
            }
            ExecBehaviour::Fail(messages) => {
                let log = messages
                    .iter()
                    .map(|m| LogEntry {
                        level: LogLevel::Error,
                        time: -1.0,
                        message: m.clone(),
                    })
                    .collect();
                (false, log)
            }
            ExecBehaviour::FailWithLog(entries) => (false, entries.clone()),
            ExecBehaviour::NoOutput => (true, Vec::new()),
        };
        if let Some(m) = state.modules.get_mut(&module.as_raw()) {
            m.log = log;
        }
        ok
    }

    fn module_log(&self, module: ModuleHandle, index: usize) -> Option<LogEntry> {
        let state = self.state.borrow();
        state.modules.get(&module.as_raw())?.log.get(index).cloned()
    }

    fn module_free(&self, module: ModuleHandle) {
        let mut state = self.state.borrow_mut();
        if state.modules.remove(&module.as_raw()).is_none() {
            state.invalid_frees += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssc::{Data, Module, NO_LOG_MESSAGES, submit};

    fn ones(inputs: &ParameterSet) -> Vec<f64> {
        let n = inputs
            .table("res")
            .and_then(|t| t.array("dn"))
            .map_or(0, <[f64]>::len);
        vec![1.0; n]
    }

    #[test]
    fn submit_copies_nested_table_and_frees_temporary() {
        let ssc = RecordingSsc::new("m", ExecBehaviour::NoOutput);
        let mut inner = ParameterSet::new();
        inner.set_array("dn", vec![1.0, 2.0]);
        let mut outer = ParameterSet::new();
        outer.set_table("res", inner);
        outer.set_number("tilt", 25.0);

        let data = submit(&ssc, &outer).expect("submit");
        assert_eq!(ssc.data_created(), 2);
        assert_eq!(ssc.live_data(), 1);
        drop(data);
        assert_eq!(ssc.live_data(), 0);
        assert_eq!(ssc.invalid_frees(), 0);
    }

    #[test]
    fn exec_records_inputs_and_writes_output() {
        let ssc = RecordingSsc::new(
            "m",
            ExecBehaviour::Output {
                output: "gen".to_string(),
                compute: ones,
            },
        );
        let mut inner = ParameterSet::new();
        inner.set_array("dn", vec![5.0; 3]);
        let mut outer = ParameterSet::new();
        outer.set_table("res", inner);

        let data = submit(&ssc, &outer).expect("submit");
        let module = Module::create(&ssc, "m").expect("module");
        module.exec(&data).expect("exec");
        assert_eq!(data.get_array("gen").ok(), Some(vec![1.0; 3]));

        let runs = ssc.executions();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].module, "m");
        assert_eq!(runs[0].inputs, outer);
    }

    #[test]
    fn failing_module_reports_log() {
        let ssc = RecordingSsc::new("m", ExecBehaviour::Fail(vec!["bad tilt".to_string()]));
        let data = Data::create(&ssc).expect("data");
        let module = Module::create(&ssc, "m").expect("module");
        match module.exec(&data) {
            Err(Error::ModuleExec { module, messages }) => {
                assert_eq!(module, "m");
                assert_eq!(messages, ["bad tilt"]);
            }
            other => panic!("expected exec failure, got {other:?}"),
        }
    }

    #[test]
    fn failing_module_with_empty_log_still_explains() {
        let ssc = RecordingSsc::new("m", ExecBehaviour::Fail(Vec::new()));
        let data = Data::create(&ssc).expect("data");
        let module = Module::create(&ssc, "m").expect("module");
        let err = module.exec(&data).expect_err("exec must fail");
        assert!(matches!(
            &err,
            Error::ModuleExec { messages, .. } if messages == &[NO_LOG_MESSAGES]
        ));
        assert!(err.to_string().ends_with(NO_LOG_MESSAGES), "{err}");
    }

    #[test]
    fn failing_module_with_only_notices_reports_them() {
        let notice = |message: &str| LogEntry {
            level: LogLevel::Notice,
            time: -1.0,
            message: message.to_string(),
        };
        let ssc = RecordingSsc::new(
            "m",
            ExecBehaviour::FailWithLog(vec![notice("weather file read"), notice("stopped at hour 12")]),
        );
        let data = Data::create(&ssc).expect("data");
        let module = Module::create(&ssc, "m").expect("module");
        match module.exec(&data) {
            Err(Error::ModuleExec { messages, .. }) => {
                assert_eq!(messages, ["weather file read", "stopped at hour 12"]);
            }
            other => panic!("expected exec failure, got {other:?}"),
        }
    }

    #[test]
    fn notices_are_dropped_when_errors_are_logged() {
        let ssc = RecordingSsc::new(
            "m",
            ExecBehaviour::FailWithLog(vec![
                LogEntry {
                    level: LogLevel::Notice,
                    time: -1.0,
                    message: "starting".to_string(),
                },
                LogEntry {
                    level: LogLevel::Error,
                    time: 3.0,
                    message: "tilt out of range".to_string(),
                },
            ]),
        );
        let data = Data::create(&ssc).expect("data");
        let module = Module::create(&ssc, "m").expect("module");
        assert!(matches!(
            module.exec(&data),
            Err(Error::ModuleExec { ref messages, .. }) if messages == &["tilt out of range"]
        ));
    }

    #[test]
    fn unknown_module_is_an_error() {
        let ssc = RecordingSsc::new("m", ExecBehaviour::NoOutput);
        assert!(matches!(
            Module::create(&ssc, "pvsamv1"),
            Err(Error::UnknownModule(ref n)) if n == "pvsamv1"
        ));
        assert_eq!(ssc.live_modules(), 0);
    }

    #[test]
    fn double_free_is_counted() {
        let ssc = RecordingSsc::new("m", ExecBehaviour::NoOutput);
        let h = ssc.data_create().expect("data");
        ssc.data_free(h);
        ssc.data_free(h);
        assert_eq!(ssc.invalid_frees(), 1);
        assert!(matches!(
            ssc.data_set_number(h, "x", 1.0),
            Err(Error::InvalidHandle(_))
        ));
    }
}
