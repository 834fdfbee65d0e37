use std::fmt::Display;

use crate::{Resource, ServiceState};

/// Runs a check and turns any error into a result nagios understands.
pub struct Runner {
    error_state: ServiceState,
}

impl Runner {
    /// `error_state` is the state reported when the check returns an error.
    pub fn new(error_state: ServiceState) -> Self {
        Self { error_state }
    }

    pub fn safe_run<E: Display>(self, f: impl FnOnce() -> Result<Resource, E>) -> Outcome<E> {
        match f() {
            Ok(resource) => Outcome::Ok(resource),
            Err(err) => Outcome::Err(self.error_state, err),
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Runner::new(ServiceState::Unknown)
    }
}

pub enum Outcome<E> {
    Ok(Resource),
    Err(ServiceState, E),
}

impl<E: Display> Outcome<E> {
    pub fn state(&self) -> ServiceState {
        match self {
            Outcome::Ok(resource) => resource.state(),
            Outcome::Err(state, _) => *state,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.state().exit_code()
    }

    pub fn to_nagios_string(&self) -> String {
        match self {
            Outcome::Ok(resource) => resource.to_nagios_string(),
            Outcome::Err(state, err) => format!("{state} - {err}"),
        }
    }

    pub fn print_and_exit(self) -> ! {
        println!("{}", self.to_nagios_string());
        std::process::exit(self.exit_code());
    }
}
