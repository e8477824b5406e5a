//! Student-facing stand-ins: grades, timetable, and submissions.

use serde_json::{Value, json};

use courier_proto::{Body, Method, unix_millis};

use super::accounts::digest;
use super::arguments::{optional_str, require_non_empty, require_str};
use super::{HandlerContext, MethodError, MethodRegistry};
use crate::audit::AuditKind;

const COURSES: [&str; 4] = [
    "Distributed Systems",
    "Computer Networks",
    "Operating Systems",
    "Software Engineering",
];

const TIMETABLE: [(&str, &str, &str, &str); 5] = [
    ("Monday", "09:00", "Distributed Systems", "B-101"),
    ("Tuesday", "11:00", "Computer Networks", "Lab-3"),
    ("Wednesday", "14:00", "Operating Systems", "B-204"),
    ("Thursday", "10:00", "Software Engineering", "A-12"),
    ("Friday", "13:00", "Distributed Systems", "Lab-1"),
];

pub(super) fn register(registry: &mut MethodRegistry) {
    registry
        .register_fn(Method::GetGrades.as_str(), get_grades)
        .register_fn(Method::GetTimetable.as_str(), get_timetable)
        .register_fn(Method::SubmitAssignment.as_str(), submit_assignment);
}

fn letter(score: u8) -> &'static str {
    match score {
        90.. => "A",
        80..=89 => "B",
        70..=79 => "C",
        60..=69 => "D",
        _ => "F",
    }
}

/// Scores between 50 and 100 derived from the student identifier.
pub(crate) fn scores(student_id: &str) -> [u8; 4] {
    let digest = digest(student_id);
    let mut scores = [0_u8; 4];
    for (score, byte) in scores.iter_mut().zip(digest) {
        *score = 50 + byte % 51;
    }
    scores
}

/// `GET_GRADES`: reports a grade per course for `student_id`.
fn get_grades(_context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError> {
    let student_id = require_non_empty(body, "student_id")?;
    let grades: Vec<Value> = COURSES
        .iter()
        .zip(scores(student_id))
        .map(|(course, score)| json!({ "course": course, "score": score, "grade": letter(score) }))
        .collect();
    Ok(json!({ "student_id": student_id, "grades": grades }))
}

/// `GET_TIMETABLE`: reports the fixed weekly timetable.
fn get_timetable(_context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError> {
    let student_id = optional_str(body, "student_id")?;
    let entries: Vec<Value> = TIMETABLE
        .iter()
        .map(|(day, time, course, room)| {
            json!({ "day": day, "time": time, "course": course, "room": room })
        })
        .collect();
    Ok(json!({ "student_id": student_id, "entries": entries }))
}

/// `SUBMIT_ASSIGNMENT`: acknowledges a submission and audits it.
fn submit_assignment(context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError> {
    let student_id = require_non_empty(body, "student_id")?;
    let assignment_id = require_non_empty(body, "assignment_id")?;
    let content = require_str(body, "content")?;
    let submitted_at = unix_millis();

    context.record(
        AuditKind::Submission,
        json!({
            "student_id": student_id,
            "assignment_id": assignment_id,
            "size": content.len(),
        }),
    );

    Ok(json!({
        "assignment_id": assignment_id,
        "student_id": student_id,
        "size": content.len(),
        "submitted_at": submitted_at,
        "status": "received",
    }))
}
