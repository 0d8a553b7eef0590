use sluice_components::builtin_registry;

/// Execute the `components` command: list every registered class name.
pub fn execute() {
    for class in builtin_registry().class_names() {
        println!("{class}");
    }
}
