//! Moodle webservice operations and their argument layouts.
//!
//! Each known operation maps to one remote function and, optionally, an
//! `ArgumentLayout` describing which `SearchParams` keys become query
//! fields and in what order.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A webservice call the adapter knows how to make.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    GetUser,
    CreateUser,
    UpdateUser,
    GetCourses,
    EnrollUser,
    SuspendEnrolment,
    UnenrollUser,
    /// Any other remote function. Sent with the base arguments only.
    Other(String),
}

/// How an operation turns `SearchParams` into query fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentLayout {
    /// Field prefix, e.g. `users[0]` yields `users[0][email]=...`.
    pub prefix: &'static str,
    /// Required keys in emission order.
    pub fields: &'static [&'static str],
    /// Drop fields whose value is missing or falsy instead of sending them empty.
    pub skip_empty: bool,
    /// Append `prefix[suspend]` when the `suspend` param is truthy.
    pub suspend_flag: bool,
}

const GET_USER: ArgumentLayout = ArgumentLayout {
    prefix: "criteria[0]",
    fields: &["key", "value"],
    skip_empty: false,
    suspend_flag: false,
};

const CREATE_USER: ArgumentLayout = ArgumentLayout {
    prefix: "users[0]",
    fields: &["username", "createpassword", "firstname", "lastname", "email"],
    skip_empty: false,
    suspend_flag: false,
};

const UPDATE_USER: ArgumentLayout = ArgumentLayout {
    prefix: "users[0]",
    fields: &["id", "firstname", "lastname", "email"],
    skip_empty: true,
    suspend_flag: false,
};

const ENROL: ArgumentLayout = ArgumentLayout {
    prefix: "enrolments[0]",
    fields: &["roleid", "userid", "courseid"],
    skip_empty: false,
    suspend_flag: true,
};

const UNENROL: ArgumentLayout = ArgumentLayout {
    prefix: "enrolments[0]",
    fields: &["roleid", "userid", "courseid"],
    skip_empty: false,
    suspend_flag: false,
};

impl Operation {
    /// Every named operation, excluding `Other`.
    pub const ALL: [Operation; 7] = [
        Operation::GetUser,
        Operation::CreateUser,
        Operation::UpdateUser,
        Operation::GetCourses,
        Operation::EnrollUser,
        Operation::SuspendEnrolment,
        Operation::UnenrollUser,
    ];

    /// The remote `wsfunction` name.
    pub fn wsfunction(&self) -> &str {
        match self {
            Operation::GetUser => "core_user_get_users",
            Operation::CreateUser => "core_user_create_users",
            Operation::UpdateUser => "core_user_update_users",
            Operation::GetCourses => "core_course_get_courses",
            Operation::EnrollUser | Operation::SuspendEnrolment => "enrol_manual_enrol_users",
            Operation::UnenrollUser => "enrol_manual_unenrol_users",
            Operation::Other(name) => name,
        }
    }

    /// Snake-case name used by callers, e.g. `get_user`.
    pub fn name(&self) -> &str {
        match self {
            Operation::GetUser => "get_user",
            Operation::CreateUser => "create_user",
            Operation::UpdateUser => "update_user",
            Operation::GetCourses => "get_courses",
            Operation::EnrollUser => "enroll_user",
            Operation::SuspendEnrolment => "suspend_enrolment",
            Operation::UnenrollUser => "unenroll_user",
            Operation::Other(name) => name,
        }
    }

    /// Operation-specific arguments, or `None` when only the base three are sent.
    pub fn layout(&self) -> Option<&'static ArgumentLayout> {
        match self {
            Operation::GetUser => Some(&GET_USER),
            Operation::CreateUser => Some(&CREATE_USER),
            Operation::UpdateUser => Some(&UPDATE_USER),
            Operation::EnrollUser | Operation::SuspendEnrolment => Some(&ENROL),
            Operation::UnenrollUser => Some(&UNENROL),
            Operation::GetCourses | Operation::Other(_) => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Infallible;

    /// Accepts snake-case names and the four unambiguous wsfunction names.
    /// `enrol_manual_enrol_users` resolves to `EnrollUser`; anything else
    /// becomes `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "get_user" | "core_user_get_users" => Operation::GetUser,
            "create_user" | "core_user_create_users" => Operation::CreateUser,
            "update_user" | "core_user_update_users" => Operation::UpdateUser,
            "get_courses" | "core_course_get_courses" => Operation::GetCourses,
            "enroll_user" | "enrol_manual_enrol_users" => Operation::EnrollUser,
            "suspend_enrolment" => Operation::SuspendEnrolment,
            "unenroll_user" | "enrol_manual_unenrol_users" => Operation::UnenrollUser,
            other => Operation::Other(other.to_string()),
        };
        Ok(op)
    }
}
