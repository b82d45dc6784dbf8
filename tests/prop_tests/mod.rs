// Property suites, grouped like src/
mod adapter;
mod parser;
