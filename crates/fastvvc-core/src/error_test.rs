// Error type tests

use super::*;

#[test]
fn test_only_invariant_is_fatal() {
    let area = CuArea::new(0, 0, 16, 16);
    assert!(!PartitionError::insufficient_area(area, 8, 8).is_fatal());
    assert!(!PartitionError::singular("gradVer").is_fatal());
    assert!(!PartitionError::untrained(16, 32).is_fatal());
    assert!(!PartitionError::reuse_not_applicable(area, "poc mismatch").is_fatal());
    assert!(PartitionError::invariant("stack not empty").is_fatal());
}

#[test]
fn test_error_messages() {
    let err = PartitionError::insufficient_area(CuArea::new(96, 0, 64, 64), 128, 128);
    assert!(err.to_string().contains("64x64@(96,0)"));
    assert!(err.to_string().contains("128x128"));

    let err = PartitionError::singular("ratio2VSobel");
    assert!(err.to_string().contains("ratio2VSobel"));

    let err = PartitionError::untrained(16, 32);
    assert!(err.to_string().contains("16x32"));
}
