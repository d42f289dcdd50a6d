//! Contrato del reporter: la capa de presentación que recibe los eventos de
//! ciclo de vida y devuelve las decisiones del operador.
//!
//! Todas las llamadas son síncronas; `on_next_steps` es el único punto en el
//! que el runner espera una respuesta.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::executable::Executable;
use crate::execution::Execution;
use crate::scenario::Scenario;

/// Respuesta a `on_next_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStepDecision {
    /// Ejecutar el step ofrecido en la posición indicada.
    Run(usize),
    /// No continuar con ninguno: el fallo queda sin resolver.
    Decline,
    /// Detener toda la corrida.
    Quit,
}

/// Respuesta a una pregunta sí/no/salir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
    Quit,
}

pub trait Reporter {
    fn before_scenario_starts(&mut self, _scenario: &Scenario) {}
    fn after_scenario_finishes(&mut self, _scenario: &Scenario) {}
    fn before_execution_starts(&mut self, _execution: &Execution) {}
    fn on_execution_update(&mut self, _execution: &Execution, _message: &str) {}
    fn after_execution_finishes(&mut self, _execution: &Execution) {}

    /// Ofrece `steps` al operador. Debe devolver un índice dentro de `steps`
    /// o una de las decisiones de no continuar.
    fn on_next_steps(&mut self, steps: &[Executable]) -> NextStepDecision;

    fn print(&mut self, message: &str);
    fn puts(&mut self, message: &str);
    fn ask(&mut self, message: &str) -> String;

    fn ask_decision(&mut self, message: &str) -> Decision {
        let answer = self.ask(&format!("{message}, [y(yes), n(no), q(quit)]"));
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Decision::Yes,
            "q" | "quit" => Decision::Quit,
            _ => Decision::No,
        }
    }
}

/// Reporter no interactivo que registra cada llamada.
///
/// Las respuestas a next steps salen de `planned_next_steps_answers`
/// (`"y"` primer step, `"n"` o vacío declinar, `"q"` salir, `"2"` segundo
/// step); las de `ask` salen de `input`. Con `assumeyes` siempre elige el
/// primer step ofrecido.
#[derive(Debug, Default)]
pub struct LogReporter {
    pub log: Vec<Vec<String>>,
    pub output: String,
    pub planned_next_steps_answers: VecDeque<String>,
    pub input: VecDeque<String>,
    assumeyes: bool,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assumeyes(mut self, assumeyes: bool) -> Self {
        self.assumeyes = assumeyes;
        self
    }

    pub fn plan_answers<I, T>(mut self, answers: I) -> Self
        where I: IntoIterator<Item = T>,
              T: Into<String>
    {
        self.planned_next_steps_answers.extend(answers.into_iter().map(Into::into));
        self
    }

    pub fn plan_input<I, T>(mut self, input: I) -> Self
        where I: IntoIterator<Item = T>,
              T: Into<String>
    {
        self.input.extend(input.into_iter().map(Into::into));
        self
    }

    /// Nombres de los métodos llamados, en orden.
    pub fn calls(&self) -> Vec<&str> {
        self.log.iter().filter_map(|entry| entry.first().map(String::as_str)).collect()
    }

    fn record<I: IntoIterator<Item = String>>(&mut self, method: &str, args: I) {
        let mut entry = vec![method.to_string()];
        entry.extend(args);
        debug!("reporter:{}", entry.join(" | "));
        self.log.push(entry);
    }
}

impl Reporter for LogReporter {
    fn before_scenario_starts(&mut self, scenario: &Scenario) {
        self.record("before_scenario_starts", [scenario.description().to_string()]);
    }

    fn after_scenario_finishes(&mut self, scenario: &Scenario) {
        self.record("after_scenario_finishes", [scenario.description().to_string()]);
    }

    fn before_execution_starts(&mut self, execution: &Execution) {
        self.record("before_execution_starts", [execution.name.clone()]);
    }

    fn on_execution_update(&mut self, execution: &Execution, message: &str) {
        self.record("on_execution_update", [execution.name.clone(), message.to_string()]);
    }

    fn after_execution_finishes(&mut self, execution: &Execution) {
        self.record("after_execution_finishes", [execution.name.clone()]);
    }

    fn on_next_steps(&mut self, steps: &[Executable]) -> NextStepDecision {
        self.record("on_next_steps", steps.iter().map(|s| s.description().to_string()));
        let answer = if self.assumeyes {
            Some("y".to_string())
        } else {
            self.planned_next_steps_answers.pop_front()
        };
        match answer.as_deref().map(str::trim) {
            Some("y") => NextStepDecision::Run(0),
            Some("n") | Some("") | None => NextStepDecision::Decline,
            Some("q") => NextStepDecision::Quit,
            Some(other) => match other.parse::<usize>() {
                Ok(n) if n >= 1 => NextStepDecision::Run(n - 1),
                _ => {
                    warn!("unexpected next step answer `{other}`");
                    NextStepDecision::Run(usize::MAX)
                }
            },
        }
    }

    fn print(&mut self, message: &str) {
        self.record("print", [message.to_string()]);
        self.output.push_str(message);
    }

    fn puts(&mut self, message: &str) {
        self.record("puts", [message.to_string()]);
        self.output.push_str(message);
        self.output.push('\n');
    }

    fn ask(&mut self, message: &str) -> String {
        self.record("ask", [message.to_string()]);
        self.output.push_str(message);
        self.output.push('\n');
        self.input.pop_front().unwrap_or_default()
    }
}
