use std::fmt::Write;

use crate::models::{Lesson, ProgressSummary, Student, Tier};

fn lesson_footer(output: &mut String, lesson: &Lesson) {
    let _ = writeln!(output, "📝 *Assignment:* {}", lesson.assignment);
    let _ = writeln!(output, "⏰ *Deadline:* Today {}:00", lesson.deadline_hour);
    let _ = write!(
        output,
        "📨 Submit with: `/submit {}` + attach file",
        lesson.day
    );
}

/// Group post for a lesson. Advanced lessons only tease when full text goes out privately.
pub fn lesson_preview(lesson: &Lesson, advanced_sent_privately: bool) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "📚 *Lesson {}: {}*", lesson.day, lesson.title);
    let _ = writeln!(output);

    if lesson.tier == Tier::Advanced && advanced_sent_privately {
        let _ = writeln!(
            output,
            "This is an Advanced lesson. Full materials have been sent privately to approved students."
        );
    } else {
        let _ = writeln!(output, "{}", lesson.content);
    }
    let _ = writeln!(output);
    lesson_footer(&mut output, lesson);
    output
}

pub fn advanced_lesson_message(lesson: &Lesson) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "📚 *Advanced Lesson {}: {}*", lesson.day, lesson.title);
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", lesson.content);
    let _ = writeln!(output);
    lesson_footer(&mut output, lesson);
    output
}

pub fn class_report(students: &[Student]) -> String {
    if students.is_empty() {
        return "No students yet.".to_string();
    }

    let mut output = String::new();
    let _ = write!(output, "📊 *Class Report* ({} students)", students.len());
    for student in students {
        let _ = write!(
            output,
            "\n• {} ({}) – {}",
            student.full_name, student.code, student.status
        );
    }
    output
}

pub fn pending_report(day: i32, pending: &[Student]) -> String {
    if pending.is_empty() {
        return "✅ Everyone submitted!".to_string();
    }
    let codes: Vec<&str> = pending.iter().map(|s| s.code.as_str()).collect();
    format!("⏰ Missing submissions for Lesson {day}:\n{}", codes.join(", "))
}

pub fn format_average(summary: &ProgressSummary) -> String {
    match summary.average_grade {
        Some(average) => format!("{average:.1}"),
        None => "N/A".to_string(),
    }
}

pub fn progress_report(student: &Student, summary: &ProgressSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "📊 {} ({})", student.full_name, student.code);
    let _ = writeln!(output, "Submissions: {}", summary.submission_count);
    let _ = writeln!(output, "Average Score: {}", format_average(summary));
    let _ = write!(output, "Status: {}", student.status.as_str().to_uppercase());
    output
}

pub fn welcome_back(student: &Student) -> String {
    format!(
        "👋 Welcome back, {}!\nYour Student Code: {}\nStatus: {}.\n\n\
         Photex Media Service Team is here to guide you—submit on time and keep learning.",
        student.full_name,
        student.code,
        student.status.as_str().to_uppercase()
    )
}

pub fn registration_prompt() -> String {
    "👋 Welcome to Photex Media Academy (Free Basics – 4 Days)\n\n\
     To register officially, send `register` with your FULL NAME \
     (as it should appear on your certificate)."
        .to_string()
}

pub fn registration_confirmed(student: &Student) -> String {
    format!(
        "✅ Registered!\n\nName: {}\nStudent Code: {}\n\n\
         📚 You’re enrolled in *Free Basics (4 Days)*.\n\
         Trainers will lead live sessions. Submit assignments on time to earn approval to Advanced.",
        student.full_name, student.code
    )
}

pub fn upgrade_notice() -> String {
    "✅ *Free Basics Complete!*\n\n\
     🚀 Advanced Training now open. Unlock:\n\
     • Videography & Cinematic Shooting\n\
     • Editing & Professional Color Grading\n\
     • Advanced Graphics & Branding\n\
     • Portrait & Product Photography\n\
     • Marketing & Social Media Business\n\
     🏆 Certificate of Completion\n\n\
     Become a *Creative Professional* ready to design, shoot, edit, and market for real clients.\n\
     To continue, make payment via MTN/Airtel/Bank and notify a trainer.\n\
     Trainers will approve your access."
        .to_string()
}

pub fn help_text() -> String {
    let mut output = String::new();
    let _ = writeln!(output, "🤝 Photex Media Service Team — commands");
    let _ = writeln!(output);
    let _ = writeln!(output, "For Students:");
    let _ = writeln!(output, "start – Check your registration and student code");
    let _ = writeln!(output, "register <FULL NAME> – Register and get your student code");
    let _ = writeln!(output, "progress – See your progress");
    let _ = writeln!(output, "submit <DAY> – Submit your assignment (attach file!)");
    let _ = writeln!(output);
    let _ = writeln!(output, "For Trainers:");
    let _ = writeln!(output, "pin_today – Post & pin today’s prepared lesson");
    let _ = writeln!(output, "pin_custom <DAY> – Pin any lesson (1–12)");
    let _ = writeln!(output, "day_set <N>, day_next – Control cohort day");
    let _ = writeln!(output, "pending <DAY> – Who hasn’t submitted");
    let _ = writeln!(output, "mark <CODE> <DAY> <SCORE> [feedback] – Grade a submission");
    let _ = writeln!(output, "approve <CODE> – Approve into Advanced");
    let _ = writeln!(output, "pause <CODE>, resume <CODE> – Manage attendance");
    let _ = writeln!(output, "report – Class report");
    let _ = writeln!(output, "star <CODE> <DAY> – Student of the Day");
    let _ = writeln!(output, "winner <CODE> <DAY> – Challenge winner");
    let _ = writeln!(output, "bonus <CODE> – Surprise bonus to student");
    let _ = writeln!(output, "post_upgrade_notice – Announce Advanced after Day 4");
    let _ = writeln!(output);
    let _ = writeln!(output, "Admins only:");
    let _ = writeln!(output, "certify – Issue certificates to completed students");
    let _ = write!(output, "graduate – Graduate completed students and remove them from the group");
    output
}
