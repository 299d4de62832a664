mod test_path_interruption_recovers;
