///! Some utility functions

use crate::course::Course;
use crate::reconcile::UpdatePlan;
use crate::task::Task;

/// A debug utility that pretty-prints the tasks of a course
pub fn print_course_tasks(course: &Course, tasks: &[Task]) {
    println!("COURSE {} ({})", course.nickname, course.id);
    for task in tasks {
        print_task(task);
    }
}

pub fn print_task(task: &Task) {
    println!("    {}", task);
}

/// A debug utility that pretty-prints the operations of a plan
pub fn print_plan(plan: &UpdatePlan, courses: &[Course]) {
    for (course_id, course_plan) in plan.iter() {
        if course_plan.is_empty() {
            continue;
        }
        let name = courses.iter()
            .find(|course| course.id == *course_id)
            .map(|course| course.nickname.as_str())
            .unwrap_or("<unknown course>");
        println!("UPDATES {} ({})", name, course_id);
        for update in course_plan.updates() {
            println!("    {}", update);
        }
    }
}
