/// Built-in system instruction. `os` is the host platform name shown to the model.
pub fn default_system_prompt(os: &str) -> String {
    format!(
        "You are a helpful AI agent with access to computer control.\n\
         Always think step by step.\n\
         \n\
         ENVIRONMENT:\n\
         1. {os}\n\
         \n\
         IMPORTANT:\n\
         1. You don't need to start an application. It is running already.\n\
         2. A click happens at the current pointer position; move the pointer first."
    )
}
