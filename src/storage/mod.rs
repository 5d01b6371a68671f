mod records;

pub use records::RecordStore;
