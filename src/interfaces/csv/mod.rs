pub mod assignment_writer;
pub mod participant_reader;
