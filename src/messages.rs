// src/messages.rs

pub const GREETING: &str = "Hello, and welcome to the Byrnes/Lever Community Discord server! \
I'm eBeaver, the server moderation bot. Before you gain access to the server, I need to verify who you are.";

pub const ASK_NAME: &str = "What is your name? (First name only)";

pub const ASK_BUILDING: &str = "Which building do you live in? (Byrnes / Lever)";

pub const ASK_RISE: &str = "Are you a member of RiSE? (Y/N)";

pub const ASK_OVERRIDE_REASON: &str = "My records indicate that you either requested an override, \
or something was incorrect during the process. Please explain below:";

pub const NOT_LEADERSHIP: &str = "I'm sorry, it appears that you're not on the leadership team.";

pub const RETRY: &str = "I'm sorry, I can't understand what you said. Try again.";

pub const EMPTY_ANSWER: &str = "I didn't catch that. Please type your answer.";

pub const SUBMITTED: &str = "Alright, I've got all your info. Sit tight and be sure you read the server rules. \
Your verification should be approved shortly!";

pub const ASK_FREE_TEXT_MAJOR: &str =
    "Please type your major. A moderator will review it together with your override request.";

pub fn greeting_reply(name: &str) -> String {
    format!("Greetings, {}.", name)
}

pub fn ask_role_category(options: &[&str]) -> String {
    format!(
        "Which of these best describes your role or position?\n{}",
        bullet_list(options.iter().copied())
    )
}

pub fn ask_leadership_position(options: &[&str]) -> String {
    format!("Which of these is your position?\n{}", bullet_list(options.iter().copied()))
}

pub fn ask_floor(building: &str) -> String {
    format!("Which floor do you live on in {}?", building)
}

pub fn ask_college<'a>(colleges: impl Iterator<Item = &'a str>, other: &str) -> String {
    format!(
        "Which college is your major in?\n{}\nReply `{}` if you can't find it.",
        bullet_list(colleges),
        other
    )
}

pub fn ask_major<'a>(college: &str, majors: impl Iterator<Item = &'a str>, back: &str) -> String {
    format!(
        "Which major in {} are you studying?\n{}\nReply `{}` to pick another college.",
        college,
        bullet_list(majors),
        back
    )
}

pub fn approved_message(name: &str) -> String {
    format!("Welcome to the server, {}!", name)
}

/// Never includes the moderator's reason
pub fn denied_message(invite_url: &str) -> String {
    format!(
        "Your verification was denied. If you believe this was in error, you can try again by \
        joining below and requesting an override. {}",
        invite_url
    )
}

fn bullet_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .map(|item| format!("• `{}`", item))
        .collect::<Vec<_>>()
        .join("\n")
}
