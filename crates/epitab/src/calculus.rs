use serde::{Deserialize, Serialize};

/// Outcome of a closure check. `closed` means the input is unsatisfiable.
#[derive(Debug, Serialize, Deserialize)]
pub struct CloseMsg {
    pub closed: bool,
    pub msg: String,
}

pub trait Calculus<'f> {
    type Params;
    type State;
    type Error;

    fn parse_formula(
        formula: &'f str,

        params: Option<Self::Params>,
    ) -> Result<Self::State, Self::Error>;

    fn validate(_state: Self::State) -> bool {
        true
    }

    fn check_close(state: Self::State) -> CloseMsg;
}
