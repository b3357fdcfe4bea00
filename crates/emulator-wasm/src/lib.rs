//! Browser host adapter.
//!
//! Wraps the assembler and the emulator core behind `wasm-bindgen` so the
//! web UI can assemble source, step the machine, and read state dumps.
//! Change highlighting and run-loop batching live on the JS side; this
//! layer only moves values across the boundary.

use serde::{Deserialize, Serialize};
use slate_asm::assemble;
use slate_core::{
    Console, ConsoleOutput, Gpr, Interpreter, Ram, StateDump, StepOutcome, SystemBus,
    CONSOLE_BASE, CONSOLE_LEN, DEFAULT_RAM_BYTES,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format!($($t)*)))
}

/// JS-compatible step outcome.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WasmStepOutcome {
    /// Instruction retired normally.
    Retired,
    /// A trap was delivered; execution continues at the trap vector.
    Trap {
        /// Cause code as stored in `mcause`.
        code: u32,
        /// Human-readable cause.
        cause: String,
        /// Faulting instruction address.
        epc: u32,
    },
    /// `ebreak`: the host should pause its run loop.
    Halt,
}

impl From<StepOutcome> for WasmStepOutcome {
    fn from(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::Retired => Self::Retired,
            StepOutcome::Trap { cause, epc } => Self::Trap {
                code: cause.as_u32(),
                cause: cause.to_string(),
                epc,
            },
            StepOutcome::Halt => Self::Halt,
        }
    }
}

/// JS-compatible batched-run outcome.
#[derive(Serialize, Deserialize)]
pub struct WasmRunOutcome {
    /// Steps actually executed.
    pub steps: u32,
    /// Last step's outcome.
    pub final_step: WasmStepOutcome,
}

/// JS-compatible assembler response.
#[derive(Serialize, Deserialize)]
pub struct WasmAssembleResult {
    /// Whether assembly succeeded and the machine was (re)loaded.
    pub ok: bool,
    /// Diagnostics when `ok` is false.
    pub errors: Vec<WasmDiagnostic>,
    /// Disassembly dump when `ok` is true.
    pub dump: String,
}

/// One assembler diagnostic.
#[derive(Serialize, Deserialize)]
pub struct WasmDiagnostic {
    /// 1-based source line.
    pub line: u32,
    /// Message text.
    pub message: String,
}

/// The machine instance driven by the web UI.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: Interpreter<SystemBus>,
    terminal: ConsoleOutput,
    line_map: Vec<(u32, u32)>,
}

fn fresh_machine(origin: u32, image: &[u8]) -> (Interpreter<SystemBus>, ConsoleOutput) {
    let mut ram = Ram::new(0, DEFAULT_RAM_BYTES);
    if let Err(fault) = ram.load(origin, image) {
        console_log!("image load failed: {fault}");
    }

    let console = Console::new();
    let output = console.output();
    let mut bus = SystemBus::new(ram);
    bus.map_device(CONSOLE_BASE, CONSOLE_LEN, Box::new(console));

    (Interpreter::new(bus), output)
}

#[wasm_bindgen]
impl WasmMachine {
    /// Creates an empty machine with default-sized RAM.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        let (machine, terminal) = fresh_machine(0, &[]);
        Self {
            machine,
            terminal,
            line_map: Vec::new(),
        }
    }

    /// Assembles `source` at `origin` and, on success, reloads the machine
    /// with the new image: PC at `_start` (or the origin) and SP at the
    /// top of RAM.
    pub fn assemble(&mut self, source: &str, origin: u32) -> JsValue {
        let result = match assemble(source, origin) {
            Ok(assembly) => {
                let (mut machine, terminal) = fresh_machine(origin, &assembly.image);
                let entry = assembly.symbols.get("_start").copied().unwrap_or(origin);
                machine.set_pc(entry);
                machine.set_register(Gpr::SP, origin.wrapping_add(DEFAULT_RAM_BYTES as u32));

                self.machine = machine;
                self.terminal = terminal;
                self.line_map = assembly.line_map.iter().map(|(a, l)| (*a, *l)).collect();

                console_log!("assembled {} bytes at {origin:#x}", assembly.image.len());
                WasmAssembleResult {
                    ok: true,
                    errors: Vec::new(),
                    dump: assembly.dump,
                }
            }
            Err(diagnostics) => WasmAssembleResult {
                ok: false,
                errors: diagnostics
                    .into_iter()
                    .map(|d| WasmDiagnostic {
                        line: d.line,
                        message: d.message,
                    })
                    .collect(),
                dump: String::new(),
            },
        };
        serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
    }

    /// Executes a single instruction.
    pub fn step(&mut self) -> JsValue {
        let outcome = WasmStepOutcome::from(self.machine.step());
        serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL)
    }

    /// Executes up to `max_steps` instructions, stopping early on `Halt`.
    /// Batch size is UI policy; the core has no say in it.
    pub fn run(&mut self, max_steps: u32) -> JsValue {
        let mut steps = 0;
        let mut last = StepOutcome::Retired;
        while steps < max_steps {
            last = self.machine.step();
            steps += 1;
            if last == StepOutcome::Halt {
                break;
            }
        }
        let outcome = WasmRunOutcome {
            steps,
            final_step: last.into(),
        };
        serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL)
    }

    /// Returns the full architectural state dump as a JS object.
    #[must_use]
    pub fn state(&self) -> JsValue {
        let dump: StateDump = self.machine.dump_state();
        serde_wasm_bindgen::to_value(&dump).unwrap_or(JsValue::NULL)
    }

    /// Drains and returns everything the guest wrote to the console.
    pub fn terminal(&mut self) -> String {
        let mut buffer = self.terminal.borrow_mut();
        let text = String::from_utf8_lossy(&buffer).into_owned();
        buffer.clear();
        text
    }

    /// Returns the 1-based source line for an instruction address, or 0.
    #[must_use]
    pub fn source_line(&self, addr: u32) -> u32 {
        self.line_map
            .iter()
            .find_map(|(a, line)| (*a == addr).then_some(*line))
            .unwrap_or(0)
    }

    /// Returns the current program counter.
    #[must_use]
    pub fn pc(&self) -> u32 {
        self.machine.pc()
    }

    /// Reads RAM for the memory view, one byte per element.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_memory(&self, addr: u32, len: u32) -> js_sys::Uint8Array {
        let ram = self.machine.bus().ram();
        let array = js_sys::Uint8Array::new_with_length(len);
        for i in 0..len {
            let byte = ram
                .read(addr.wrapping_add(i), slate_core::AccessWidth::Byte)
                .unwrap_or(0);
            array.set_index(i, byte as u8);
        }
        array
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}
