// Signal I/O - CSV loading, validation, and writing
//
// The CSV column contract (`time, voltage, current`) is the only persisted
// boundary of the pipeline; everything downstream works on in-memory arrays.

pub mod csv;

pub use csv::{load_signal, write_signal, SignalData};
