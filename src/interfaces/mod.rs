//! Input/output adapters: CSV import of participants and export of assignments.

pub mod csv;
