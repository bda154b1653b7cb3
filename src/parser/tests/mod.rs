mod tests_scanner;
