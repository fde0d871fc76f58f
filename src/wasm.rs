//! WebAssembly bindings for GA of Life.
//!
//! Provides thin wrappers around the Game of Life and evolution run loops
//! for browser environments. The page drives each loop from its animation
//! frame: dispatch JSON commands, pump with `performance.now()`, then read
//! the state snapshot and plot updates.

use std::time::Duration;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    control::{RunLoop, SeedBinding, SeedSync, clock_from_millis},
    engine::{EngineFactory, EvolutionEngineFactory, LifeEngineFactory},
    schema::{ControlConfig, SimulationConfig},
};

/// Initialize WASM module with panic hook and logging.
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages in browser
    console_error_panic_hook::set_once();

    // Initialize WASM logger
    wasm_logger::init(wasm_logger::Config::default());
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

fn parse_control(
    control_json: Option<String>,
    default: ControlConfig,
) -> Result<ControlConfig, JsValue> {
    let control = match control_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| JsValue::from_str(&format!("Invalid control JSON: {e}")))?,
        None => default,
    };
    control
        .validate()
        .map_err(|e| JsValue::from_str(&format!("Invalid control config: {e}")))?;
    Ok(control)
}

fn parse_config(config_json: &str) -> Result<SimulationConfig, JsValue> {
    serde_json::from_str(config_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid config JSON: {e}")))
}

/// `performance.now()` milliseconds as a run-loop clock offset.
fn clock(now_ms: f64) -> Duration {
    clock_from_millis(now_ms)
}

fn dispatch<F: EngineFactory>(
    run_loop: &mut RunLoop<F>,
    command_json: &str,
    now_ms: f64,
) -> Result<bool, JsValue> {
    run_loop
        .dispatch_json(command_json, clock(now_ms))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn next_wakeup<F: EngineFactory>(run_loop: &RunLoop<F>) -> Option<f64> {
    run_loop.next_wakeup().map(|at| at.as_secs_f64() * 1000.0)
}

/// Game of Life run loop.
#[wasm_bindgen]
pub struct WasmLifeControl {
    run_loop: RunLoop<LifeEngineFactory>,
    binding: SeedBinding,
}

#[wasm_bindgen]
impl WasmLifeControl {
    /// Create a run loop from a JSON `SimulationConfig` used as the base for
    /// seeded runs and an optional JSON `ControlConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: &str,
        control_json: Option<String>,
    ) -> Result<WasmLifeControl, JsValue> {
        let config = parse_config(config_json)?;
        let control = parse_control(control_json, ControlConfig::life())?;
        Ok(WasmLifeControl {
            run_loop: RunLoop::new(LifeEngineFactory, control),
            binding: SeedBinding::new(config),
        })
    }

    /// Apply a JSON command such as `{"type": "toggle_auto_run"}`.
    #[wasm_bindgen]
    pub fn dispatch(&mut self, command_json: &str, now_ms: f64) -> Result<bool, JsValue> {
        dispatch(&mut self.run_loop, command_json, now_ms)
    }

    /// Collect completions and start due steps.
    #[wasm_bindgen]
    pub fn pump(&mut self, now_ms: f64) {
        self.run_loop.pump(clock(now_ms));
    }

    /// Seed the grid with a phenotype bit string; unchanged seeds are ignored.
    ///
    /// Returns `"missing"`, `"unchanged"` or `"reseeded"`.
    #[wasm_bindgen(js_name = syncSeed)]
    pub fn sync_seed(&mut self, seed: Option<String>, now_ms: f64) -> String {
        let sync = self
            .binding
            .sync(seed.as_deref(), &mut self.run_loop, clock(now_ms));
        match sync {
            SeedSync::Missing => "missing",
            SeedSync::Unchanged => "unchanged",
            SeedSync::Reseeded => "reseeded",
        }
        .to_string()
    }

    /// Replace the base config used by the next seeded run.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        self.binding.set_base(parse_config(config_json)?);
        Ok(())
    }

    /// Get the current run state as a JS object.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        to_js(&*self.run_loop.state())
    }

    /// Drain plot updates produced since the last call.
    #[wasm_bindgen(js_name = takePlotUpdates)]
    pub fn take_plot_updates(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.run_loop.take_plot_updates())
    }

    /// Milliseconds at which the next auto-play tick is due.
    #[wasm_bindgen(js_name = nextWakeup)]
    pub fn next_wakeup(&self) -> Option<f64> {
        next_wakeup(&self.run_loop)
    }

    /// Cells ever alive, one byte per cell, row-major.
    #[wasm_bindgen(js_name = getActivationMap)]
    pub fn get_activation_map(&self) -> Vec<u8> {
        self.run_loop
            .activation_map()
            .cells()
            .iter()
            .map(|&c| c as u8)
            .collect()
    }

    #[wasm_bindgen(js_name = getWidth)]
    pub fn get_width(&self) -> usize {
        self.run_loop.activation_map().width()
    }

    #[wasm_bindgen(js_name = getHeight)]
    pub fn get_height(&self) -> usize {
        self.run_loop.activation_map().height()
    }
}

/// Evolutionary algorithm run loop.
#[wasm_bindgen]
pub struct WasmEvolutionControl {
    run_loop: RunLoop<EvolutionEngineFactory>,
}

#[wasm_bindgen]
impl WasmEvolutionControl {
    /// Create a run loop from an optional JSON `ControlConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(control_json: Option<String>) -> Result<WasmEvolutionControl, JsValue> {
        let control = parse_control(control_json, ControlConfig::evolution())?;
        Ok(WasmEvolutionControl {
            run_loop: RunLoop::new(EvolutionEngineFactory, control),
        })
    }

    /// Apply a JSON command such as `{"type": "initialize", "config": {...}}`.
    #[wasm_bindgen]
    pub fn dispatch(&mut self, command_json: &str, now_ms: f64) -> Result<bool, JsValue> {
        dispatch(&mut self.run_loop, command_json, now_ms)
    }

    /// Collect completions and start due steps.
    #[wasm_bindgen]
    pub fn pump(&mut self, now_ms: f64) {
        self.run_loop.pump(clock(now_ms));
    }

    /// Get the current run state as a JS object.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        to_js(&*self.run_loop.state())
    }

    /// Drain plot updates produced since the last call.
    #[wasm_bindgen(js_name = takePlotUpdates)]
    pub fn take_plot_updates(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.run_loop.take_plot_updates())
    }

    #[wasm_bindgen(js_name = nextWakeup)]
    pub fn next_wakeup(&self) -> Option<f64> {
        next_wakeup(&self.run_loop)
    }

    /// Best phenotype of the latest generation, ready for `syncSeed`.
    #[wasm_bindgen(js_name = bestPhenotype)]
    pub fn best_phenotype(&self) -> Option<String> {
        self.run_loop
            .state()
            .last_observation
            .as_ref()
            .and_then(|o| o.best_phenotype.clone())
    }
}
