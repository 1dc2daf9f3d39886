//! Signup form checks run before anything is sent to the backend.

use glycowatch_shared::SignupRequest;

use crate::error::{ClientError, ClientResult};

pub const USERNAME_REQUIRED: &str = "Please enter a username";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match";
pub const INVALID_HEIGHT: &str = "Please enter a valid height";
pub const INVALID_WEIGHT: &str = "Please enter a valid weight";
pub const INVALID_AGE: &str = "Please enter a valid age";
pub const INVALID_PREGNANCIES: &str = "Please enter a valid number of pregnancies";

const MAX_AGE: i64 = 150;

/// Signup fields exactly as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    /// Metres.
    pub height: String,
    /// Kilograms.
    pub weight: String,
    pub age: String,
    pub pregnancies: String,
}

impl SignupForm {
    /// Checks the fields in form order and stops at the first problem.
    pub fn validate(&self) -> ClientResult<SignupRequest> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ClientError::validation(USERNAME_REQUIRED).in_op("signup.validate"));
        }

        if self.password != self.confirm_password {
            return Err(ClientError::validation(PASSWORDS_DIFFER).in_op("signup.validate"));
        }

        let height_m = positive(&self.height).ok_or_else(|| invalid(INVALID_HEIGHT, "height"))?;
        let weight_kg = positive(&self.weight).ok_or_else(|| invalid(INVALID_WEIGHT, "weight"))?;

        let age = whole(&self.age)
            .filter(|age| (1..=MAX_AGE).contains(age))
            .ok_or_else(|| invalid(INVALID_AGE, "age"))?;

        let pregnancies = whole(&self.pregnancies)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| invalid(INVALID_PREGNANCIES, "pregnancies"))?;

        Ok(SignupRequest {
            username: username.to_string(),
            password: self.password.clone(),
            pregnancies,
            weight_kg,
            height_m,
            // 1..=150 always fits.
            age: age as u32,
        })
    }
}

fn invalid(message: &str, field: &str) -> ClientError {
    ClientError::validation(message).in_op_with("signup.validate", field)
}

fn number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn positive(raw: &str) -> Option<f64> {
    number(raw).filter(|v| *v > 0.0)
}

/// Integer part of the input, so "30.5" reads as 30.
fn whole(raw: &str) -> Option<i64> {
    number(raw).map(|v| v.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientErrorKind;

    fn form() -> SignupForm {
        SignupForm {
            username: "alice".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            height: "1.7".to_string(),
            weight: "65".to_string(),
            age: "30".to_string(),
            pregnancies: "0".to_string(),
        }
    }

    fn rejects(form: SignupForm, expected: &str) {
        let err = form.validate().unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Validation);
        assert_eq!(err.message(), expected);
    }

    #[test]
    fn valid_form_becomes_request() {
        let req = form().validate().unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.height_m, 1.7);
        assert_eq!(req.weight_kg, 65.0);
        assert_eq!(req.age, 30);
        assert_eq!(req.pregnancies, 0);
    }

    #[test]
    fn mismatched_passwords() {
        rejects(
            SignupForm {
                confirm_password: "secret2".to_string(),
                ..form()
            },
            PASSWORDS_DIFFER,
        );
    }

    #[test]
    fn empty_username() {
        rejects(
            SignupForm {
                username: "   ".to_string(),
                ..form()
            },
            USERNAME_REQUIRED,
        );
    }

    #[test]
    fn non_positive_measurements() {
        for height in ["0", "-1.6", "tall", "", "NaN"] {
            rejects(
                SignupForm {
                    height: height.to_string(),
                    ..form()
                },
                INVALID_HEIGHT,
            );
        }
        rejects(
            SignupForm {
                weight: "0".to_string(),
                ..form()
            },
            INVALID_WEIGHT,
        );
    }

    #[test]
    fn age_bounds() {
        for age in ["0", "151", "-3", "old"] {
            rejects(
                SignupForm {
                    age: age.to_string(),
                    ..form()
                },
                INVALID_AGE,
            );
        }
        let edge = SignupForm {
            age: "150".to_string(),
            ..form()
        };
        assert_eq!(edge.validate().unwrap().age, 150);
    }

    #[test]
    fn pregnancies_must_be_a_count() {
        rejects(
            SignupForm {
                pregnancies: "-1".to_string(),
                ..form()
            },
            INVALID_PREGNANCIES,
        );
        let truncated = SignupForm {
            pregnancies: "2.9".to_string(),
            ..form()
        };
        assert_eq!(truncated.validate().unwrap().pregnancies, 2);
    }

    #[test]
    fn first_problem_wins() {
        let form = SignupForm {
            confirm_password: "other".to_string(),
            height: "0".to_string(),
            ..form()
        };
        assert_eq!(form.validate().unwrap_err().message(), PASSWORDS_DIFFER);
    }
}
