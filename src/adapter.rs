//! Runs a weather table through the `pvwattsv5` compute module.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::params::{self, ParameterSet};
use crate::site::Site;
use crate::ssc::{Data, Module, SscApi, submit};
use crate::system::PvSystem;
use crate::weather::{GENERATION, WeatherTable};

/// Compute module producing hourly AC output.
pub const PVWATTS_MODULE: &str = "pvwattsv5";
/// Module output holding AC generation per timestep.
pub const GENERATION_OUTPUT: &str = "gen";

/// Simulates `table` and appends the engine's generation series as the
/// `generation` column.
///
/// The table is only modified once the engine has returned an output of the
/// right length; on error it is left exactly as it was. Engine handles are
/// released on every path.
///
/// # Arguments
///
/// * `ssc` - Engine to run against
/// * `table` - Weather series with `DNI`, `DHI`, `Wind Speed`, `Temperature`
/// * `site` - Location submitted with the resource data
/// * `system` - PV system design
///
/// # Errors
///
/// Input validation errors are returned before the engine is touched.
/// Engine failures surface as [`Error::UnknownModule`], [`Error::ModuleExec`],
/// [`Error::MissingOutput`] or [`Error::OutputLength`].
pub fn call_ssc_with_table<A: SscApi + ?Sized>(
    ssc: &A,
    table: &mut WeatherTable,
    site: &Site,
    system: &PvSystem,
) -> Result<()> {
    let inputs = params::simulation_inputs(table, site, system)?;
    let generation = run_module(ssc, &inputs, PVWATTS_MODULE, GENERATION_OUTPUT, table.len())?;
    table.insert_column(GENERATION, generation)
}

/// Submits `inputs`, executes `module` and reads back `output`.
///
/// # Errors
///
/// [`Error::OutputLength`] if the output does not have `expected_len` values,
/// plus anything the engine reports.
pub fn run_module<A: SscApi + ?Sized>(
    ssc: &A,
    inputs: &ParameterSet,
    module: &str,
    output: &str,
    expected_len: usize,
) -> Result<Vec<f64>> {
    debug!(variables = inputs.len(), "submitting simulation inputs");
    let dat: Data<'_, A> = submit(ssc, inputs)?;
    let module = Module::create(ssc, module)?;

    info!(module = module.name(), rows = expected_len, "running compute module");
    if let Err(err) = module.exec(&dat) {
        if let Error::ModuleExec { messages, .. } = &err {
            for message in messages {
                warn!(module = module.name(), "{message}");
            }
        }
        return Err(err);
    }

    let values = dat.get_array(output)?;
    if values.len() != expected_len {
        return Err(Error::OutputLength {
            name: output.to_string(),
            expected: expected_len,
            actual: values.len(),
        });
    }
    info!(
        output,
        total = values.iter().sum::<f64>(),
        "compute module finished"
    );
    Ok(values)
}
