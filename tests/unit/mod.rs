mod options_override_tests;
mod schema_validator_plugpoint_tests;
mod validate_file_tests;
