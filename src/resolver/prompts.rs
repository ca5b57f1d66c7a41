use crate::oracle::parse::element_info_format_instructions;

pub fn presence_prompt(request: &str, hierarchy: &str) -> String {
    format!(
        r#"Here is the hierarchy of elements of the android application screen, answer with one word YES or NO.
There is something similar or related to "{request}" on the screen?

Elements hierarchy:
{hierarchy}"#
    )
}

pub fn extraction_prompt(request: &str, hierarchy: &str) -> String {
    format!(
        r#"Here is the hierarchy of UI-elements of the android application screen.
Analyze this hierarchy and complete the following tasks with target element = "{request}":
1. Come up with a concise screen name for the class name in autotests that describes this hierarchy of elements
2. Come up with a short description of the application screen, it is necessary to list all the main interface elements with which the user can interact
3. Come up with a concise target element name for the screen object field name in autotests
4. Extract the short XPath for the target element from the hierarchy. First of all try to search by id or description!!! Find deepest view in hierarchy!!! The XPath should be abstract and universal, and **should not depend on the specific data** being displayed (names, dates, exchange rates, prices, specific weather, etc.)!!!

Elements hierarchy:
{hierarchy}

{instructions}"#,
        instructions = element_info_format_instructions()
    )
}

pub fn another_locator_request(matches: usize) -> String {
    format!(
        "Come up with another xpath, this one doesn't work (it matches {} elements, exactly one is required). Return only the xpath string in the response!!!",
        matches
    )
}

pub fn reformat_request(reason: &str) -> String {
    format!(
        "Your answer could not be parsed ({}). Answer again, strictly in the required format.",
        reason
    )
}
