pub mod clash_output;
