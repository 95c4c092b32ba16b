use ut_core::{Key, UiTestError};
use ut_runtime::{Engine, ExecutionContext, StepResult};

pub(crate) const DEMO_GROUP: &str = "demo_test";
pub(crate) const BROWSER_GROUP: &str = "browser";

/// Registers the scenarios the demo host ships with, in run order.
pub(crate) fn register_demo_scenarios(engine: &mut Engine) -> Result<usize, UiTestError> {
    engine.register_scenario(DEMO_GROUP, "test1", click_test_file)?;
    engine.register_scenario(BROWSER_GROUP, "open_with_double_click", open_with_double_click)?;
    engine.register_scenario(BROWSER_GROUP, "open_with_keyboard", open_with_keyboard)?;
    engine.register_scenario(BROWSER_GROUP, "open_button", open_with_button)?;
    Ok(engine.registry().len())
}

fn click_test_file(ctx: &mut ExecutionContext<'_>) -> StepResult {
    ctx.item_click("**/test.txt")
}

fn open_with_double_click(ctx: &mut ExecutionContext<'_>) -> StepResult {
    ctx.key_press(Key::Escape)?;
    ctx.item_double_click("**/test.txt")?;
    ctx.wait_for("Files/opened test.txt[text]")?;
    ctx.log_info("test.txt opened by double click");
    Ok(())
}

fn open_with_keyboard(ctx: &mut ExecutionContext<'_>) -> StepResult {
    ctx.key_press(Key::Escape)?;
    ctx.item_navigate("**/test.txt")?;
    ctx.wait_for("Files/selected test.txt[text]")?;
    ctx.key_press(Key::Enter)?;
    ctx.wait_for("Files/opened test.txt[text]")
}

fn open_with_button(ctx: &mut ExecutionContext<'_>) -> StepResult {
    ctx.set_ref("Files")?;
    let shown = ctx.item_exists("Open[button]")?;
    ctx.check(shown, "the Open button is shown")?;
    ctx.key_press(Key::Escape)?;
    ctx.item_click("*/test.txt")?;
    ctx.item_click("Open[button]")?;
    ctx.wait_for("opened test.txt[text]")
}
