//! Step definitions for job coordination BDD scenarios.
