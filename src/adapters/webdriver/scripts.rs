//! Page scripts run through `execute/sync`. Each takes its inputs from
//! `arguments` so selectors stay in one place.

/// `arguments[0]`: month pane selector. Returns its outer HTML or `null`.
pub const READ_MONTH_PANE: &str = r"
const pane = document.querySelector(arguments[0]);
return pane ? pane.outerHTML : null;
";

/// `arguments[0]`: aria-label of the navigation button. Returns whether an
/// enabled button was clicked.
pub const CLICK_BY_ARIA_LABEL: &str = r#"
const button = document.querySelector(`button[aria-label="${arguments[0]}"]`);
if (!button || button.disabled || button.getAttribute("aria-disabled") === "true") {
  return false;
}
button.click();
return true;
"#;

/// `arguments[0]`: month pane selector, `arguments[1]`: row selector,
/// `arguments[2]`/`arguments[3]`: week and day index.
pub const CLICK_DAY: &str = r#"
const pane = document.querySelector(arguments[0]);
if (!pane) return false;
const rows = pane.querySelectorAll(arguments[1]);
const row = rows[arguments[2]];
if (!row) return false;
const cell = row.querySelectorAll("td")[arguments[3]];
if (!cell || cell.getAttribute("role") !== "button" || cell.getAttribute("aria-disabled") !== "false") {
  return false;
}
cell.click();
return true;
"#;

/// `arguments[0]`: date range selector, `arguments[1]`: price selectors in
/// preference order. Returns `{dateRange, totalPrice}`.
pub const READ_QUOTE: &str = r#"
const range = document.querySelector(arguments[0]);
let totalPrice = null;
for (const selector of arguments[1]) {
  const el = document.querySelector(selector);
  if (el && el.textContent.includes("$")) {
    totalPrice = el.textContent.trim();
    break;
  }
}
return { dateRange: range ? range.textContent.trim() : null, totalPrice };
"#;

/// `arguments[0]`: button text. Returns whether an enabled button was clicked.
pub const CLICK_BY_TEXT: &str = r#"
for (const button of document.querySelectorAll("button")) {
  if (button.textContent.trim() === arguments[0] && !button.disabled) {
    button.click();
    return true;
  }
}
return false;
"#;

pub const READ_DOCUMENT: &str = "return document.documentElement.outerHTML;";

/// `arguments[0]`: selector. Returns how many elements match it.
pub const COUNT_MATCHES: &str = "return document.querySelectorAll(arguments[0]).length;";
