//! Built-in word pool for [`RandomBoardGenerator`](crate::RandomBoardGenerator).

pub(crate) const WORDS: &[&str] = &[
    "Africa", "Agent", "Air", "Alien", "Amazon", "Angel", "Antarctica", "Apple", "Arm", "Back",
    "Band", "Bank", "Bark", "Beach", "Belt", "Berlin", "Berry", "Board", "Bond", "Boom",
    "Bow", "Box", "Bug", "Canada", "Capital", "Cell", "Center", "China", "Chocolate", "Circle",
    "Club", "Compound", "Copper", "Crash", "Cricket", "Cross", "Death", "Dice", "Dinosaur",
    "Doctor", "Dog", "Dress", "Dwarf", "Eagle", "Egypt", "Engine", "England", "Europe", "Eye",
    "Fair", "Fall", "Fan", "Field", "File", "Film", "Fish", "Flute", "Fly", "Forest", "Fork",
    "France", "Gas", "Ghost", "Giant", "Glass", "Glove", "Gold", "Grass", "Greece", "Green",
    "Ham", "Head", "Himalaya", "Hole", "Hood", "Hook", "Human", "Horseshoe", "Hospital",
    "Hotel", "Ice", "Ice Cream", "India", "Iron", "Ivory", "Jam", "Jet", "Jupiter", "Kangaroo",
    "Ketchup", "Kid", "King", "Kiwi", "Knife", "Knight", "Lab", "Lap", "Laser", "Lawyer",
    "Lead", "Lemon", "Limousine", "Lock", "Log", "Machine", "Mammoth", "Maple", "March",
    "Mass", "Mercury", "Millionaire", "Model", "Mole", "Moscow", "Mouth", "Mug", "Needle",
    "Net", "New York", "Night", "Note", "Novel", "Nurse", "Nut", "Oil", "Olive", "Olympus",
    "Opera", "Orange", "Paper", "Park", "Part", "Paste", "Phoenix", "Piano", "Pilot", "Pin",
    "Pipe", "Pirate", "Pistol", "Pit", "Plate", "Poison", "Pole", "Port", "Press", "Princess",
    "Pumpkin", "Pupil", "Pyramid", "Queen", "Rabbit", "Racket", "Ray", "Revolution", "Ring",
    "Robin", "Robot", "Rock", "Rome", "Root", "Rose", "Round", "Row", "Ruler", "Satellite",
    "Saturn", "Scale", "School", "Scientist", "Scorpion", "Screen", "Seal", "Server", "Shadow",
    "Shakespeare", "Shark", "Ship", "Shoe", "Shop", "Shot", "Sink", "Skyscraper", "Slip",
    "Slug", "Smuggler", "Snow", "Snowman", "Sock", "Soldier", "Soul", "Sound", "Space",
    "Spell", "Spider", "Spike", "Spine", "Spot", "Spring", "Spy", "Square", "Stadium", "Staff",
    "Star", "State", "Stick", "Stock", "Straw", "Stream", "Strike", "String", "Sub", "Suit",
    "Superhero", "Swing", "Switch", "Table", "Tablet", "Tag", "Tail", "Tap", "Tea",
    "Telescope", "Temple", "Theater", "Thief", "Thumb", "Tick", "Tie", "Time", "Tokyo",
    "Tooth", "Torch", "Tower", "Track", "Train", "Triangle", "Trip", "Trunk", "Tube", "Turkey",
    "Undertaker", "Unicorn", "Vacuum", "Van", "Vet", "Wake", "Wall", "War", "Washer",
    "Washington", "Watch", "Water", "Wave", "Web", "Well", "Whale", "Whip", "Wind", "Witch",
    "Worm", "Yard",
];
