#![no_main]

use arbitrary::Arbitrary;
use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use stepgate_harness::{Action, Field, FlightBooking, FlightType};

#[derive(Arbitrary, Debug)]
enum FuzzAction {
    Type { field: u8, text: String },
    Choose(bool),
    Prev,
    Next,
    Jump(u8),
    Finish,
}

impl FuzzAction {
    fn to_action(&self) -> Action {
        match self {
            FuzzAction::Type { field, text } => {
                let field = Field::ALL[usize::from(*field) % Field::ALL.len()];
                Action::Type(field, text.chars().take(32).collect())
            }
            FuzzAction::Choose(one_way) => Action::Choose(if *one_way {
                FlightType::OneWay
            } else {
                FlightType::Return
            }),
            FuzzAction::Prev => Action::Prev,
            FuzzAction::Next => Action::Next,
            FuzzAction::Jump(index) => Action::Jump(usize::from(*index % 4)),
            FuzzAction::Finish => Action::Finish,
        }
    }
}

fuzz_target!(|input: Vec<FuzzAction>| {
    let Some(today) = NaiveDate::from_ymd_opt(2017, 9, 15) else {
        return;
    };
    let Ok(booking) = FlightBooking::new(today) else {
        return;
    };

    for action in input.iter().take(256) {
        let before = booking.wizard.state();
        let outcome = booking.apply(&action.to_action());
        let after = booking.wizard.state();

        assert!(after.progress >= before.progress);
        assert!(after.active <= after.progress);
        assert!(after.progress <= booking.wizard.last_index());
        if !outcome.accepted {
            assert_eq!(before, after);
        }
        assert_eq!(
            booking.wizard.finish_enabled().get(),
            Ok(after.progress == booking.wizard.last_index()
                && booking.wizard.all_steps_valid().get() == Ok(true))
        );
    }
});
